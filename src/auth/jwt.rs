use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::{Claims, TokenKind};
use crate::{config::JwtConfig, errors::AppError, state::AppState};

/// Signing and verification keys plus the claims every token must carry.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    verify_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

fn minutes(m: i64) -> Duration {
    Duration::from_secs(u64::try_from(m).unwrap_or(0).saturating_mul(60))
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: minutes(cfg.ttl_minutes),
            refresh_ttl: minutes(cfg.refresh_ttl_minutes),
            verify_ttl: minutes(cfg.verify_ttl_minutes),
        }
    }

    fn sign_with_kind(&self, user_id: i64, email: &str, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
            TokenKind::Verify => self.verify_ttl,
        };
        let ttl = TimeDuration::seconds(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));
        let exp = now.saturating_add(ttl);
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: i64, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, email, TokenKind::Access)
    }

    pub fn sign_refresh(&self, user_id: i64, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, email, TokenKind::Refresh)
    }

    pub fn sign_verify(&self, user_id: i64, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, email, TokenKind::Verify)
    }

    /// Checks signature, expiry, issuer and audience. Does not look at `kind`.
    pub fn decode(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    fn expect_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        let claims = self.decode(token).map_err(|e| {
            warn!(error = %e, expected = ?kind, "token rejected");
            AppError::Unauthenticated("Invalid or expired token")
        })?;
        if claims.kind != kind {
            warn!(user_id = claims.sub, got = ?claims.kind, expected = ?kind, "wrong token kind");
            return Err(AppError::Unauthenticated("Invalid or expired token"));
        }
        Ok(claims)
    }

    /// Gate for every data operation: only unexpired access tokens pass.
    pub fn authenticate(&self, token: &str) -> Result<Claims, AppError> {
        self.expect_kind(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AppError> {
        self.expect_kind(token, TokenKind::Refresh)
    }

    pub fn verify_email_token(&self, token: &str) -> Result<Claims, AppError> {
        self.expect_kind(token, TokenKind::Verify)
    }
}

#[cfg(test)]
pub(crate) fn test_config(secret: &str, issuer: &str, audience: &str) -> JwtConfig {
    JwtConfig {
        secret: secret.into(),
        issuer: issuer.into(),
        audience: audience.into(),
        ttl_minutes: 5,
        refresh_ttl_minutes: 60,
        verify_ttl_minutes: 60,
    }
}

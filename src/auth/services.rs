use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::{
    dto::{RegisterRequest, TokenResponse},
    jwt::JwtKeys,
    repo_types::User,
};
use crate::errors::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims and checks the registration payload in place.
pub fn validate_registration(req: &mut RegisterRequest) -> Result<(), AppError> {
    req.username = req.username.trim().to_string();
    req.email = normalize_email(&req.email);

    if req.username.is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest("Password too short".into()));
    }
    Ok(())
}

/// Parses an avatar link; only absolute http(s) URLs with a host pass.
pub(crate) fn parse_avatar_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    let has_host = url.host_str().is_some_and(|h| !h.is_empty());
    (matches!(url.scheme(), "http" | "https") && has_host).then_some(url)
}

pub fn issue_tokens(keys: &JwtKeys, user: &User) -> anyhow::Result<TokenResponse> {
    Ok(TokenResponse {
        access_token: keys.sign_access(user.id, &user.email)?,
        refresh_token: keys.sign_refresh(user.id, &user.email)?,
        token_type: "bearer",
    })
}

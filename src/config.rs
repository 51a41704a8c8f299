use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
    pub verify_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base used when building links handed out to users (email verification).
    pub public_base_url: String,
    /// Requests per minute each client IP may make to `GET /users/me`.
    pub me_rate_limit_per_minute: u32,
}

/// Upper bound for any token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so it can be resolved
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, default: i64| -> anyhow::Result<i64> {
            match lookup(key) {
                Some(v) => v
                    .parse::<i64>()
                    .with_context(|| format!("{key} must be an integer")),
                None => Ok(default),
            }
        };

        let ttl = |key: &str, default: i64| -> anyhow::Result<i64> {
            let minutes = number(key, default)?;
            if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
                anyhow::bail!("{key} must be between 1 and {MAX_TTL_MINUTES} minutes, got {minutes}");
            }
            Ok(minutes)
        };

        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let database_max_connections: u32 = number("DATABASE_MAX_CONNECTIONS", 10)?
            .try_into()
            .context("DATABASE_MAX_CONNECTIONS out of range")?;

        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "contactbook".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "contactbook-users".into()),
            ttl_minutes: ttl("JWT_TTL_MINUTES", 30)?,
            refresh_ttl_minutes: ttl("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
            verify_ttl_minutes: ttl("JWT_VERIFY_TTL_MINUTES", 60 * 24)?,
        };

        let me_rate_limit_per_minute = u32::try_from(number("RATE_LIMIT_ME_PER_MINUTE", 5)?)
            .ok()
            .filter(|n| *n > 0)
            .context("RATE_LIMIT_ME_PER_MINUTE must be a positive integer")?;

        let port = lookup("APP_PORT").unwrap_or_else(|| "8080".into());
        let server = ServerConfig {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: port
                .parse()
                .with_context(|| format!("APP_PORT is not a valid port: {port}"))?,
            public_base_url: lookup("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8080".into())
                .trim_end_matches('/')
                .to_string(),
            me_rate_limit_per_minute,
        };

        Ok(Self {
            database_url,
            database_max_connections,
            jwt,
            server,
        })
    }
}

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::jwt::JwtKeys;
use crate::auth::notify::{LogNotifier, VerificationNotifier};
use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::contacts::repo::{ContactStore, PgContactStore};
use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub notifier: Arc<dyn VerificationNotifier>,
    /// Per-IP budget for `GET /users/me`.
    pub me_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Postgres-backed state; everything is derived from `config` once here.
    pub fn new(config: AppConfig, db: PgPool) -> Self {
        Self::from_parts(
            config,
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgContactStore::new(db)),
            Arc::new(LogNotifier),
        )
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        contacts: Arc<dyn ContactStore>,
        notifier: Arc<dyn VerificationNotifier>,
    ) -> Self {
        let jwt = JwtKeys::new(&config.jwt);
        let me_limiter = Arc::new(RateLimiter::per_minute(config.server.me_rate_limit_per_minute));
        Self {
            config: Arc::new(config),
            jwt,
            users,
            contacts,
            notifier,
            me_limiter,
        }
    }
}

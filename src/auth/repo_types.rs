use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String, // argon2 PHC string, never serialized
    pub is_active: bool,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Fields needed to insert a user; `id` and flags come from the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::repo::UserStore;
use super::repo_types::{NewUser, User};
use crate::errors::{AppError, AppResult};

/// In-process `UserStore` for tests.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    fn update<F>(&self, id: i64, f: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut rows = self.rows.lock().expect("user store poisoned");
        let user = rows.iter_mut().find(|u| u.id == id)?;
        f(user);
        Some(user.clone())
    }

    pub fn deactivate(&self, id: i64) {
        self.update(id, |u| u.is_active = false);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new: NewUser) -> AppResult<User> {
        let mut rows = self.rows.lock().expect("user store poisoned");
        if rows.iter().any(|u| u.email == new.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        if rows.iter().any(|u| u.username == new.username) {
            return Err(AppError::Conflict("Username already taken".into()));
        }
        let user = User {
            id: rows.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            is_active: true,
            is_verified: false,
            avatar_url: None,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let rows = self.rows.lock().expect("user store poisoned");
        Ok(rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let rows = self.rows.lock().expect("user store poisoned");
        Ok(rows.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let rows = self.rows.lock().expect("user store poisoned");
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn mark_verified(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.update(id, |u| u.is_verified = true))
    }

    async fn set_avatar(&self, id: i64, avatar_url: &str) -> AppResult<Option<User>> {
        Ok(self.update(id, |u| u.avatar_url = Some(avatar_url.to_string())))
    }
}

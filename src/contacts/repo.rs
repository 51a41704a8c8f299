use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Contact, ContactPatch, NewContact, Page};
use crate::errors::AppResult;

/// Owner-scoped access to contacts. Every method takes the verified owner id
/// and every implementation must filter on it inside the query itself.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn create(&self, owner: i64, new: NewContact) -> AppResult<Contact>;
    async fn list(&self, owner: i64, page: Page) -> AppResult<Vec<Contact>>;
    async fn list_all(&self, owner: i64) -> AppResult<Vec<Contact>>;
    async fn get(&self, owner: i64, id: i64) -> AppResult<Option<Contact>>;
    async fn update(&self, owner: i64, id: i64, patch: ContactPatch) -> AppResult<Option<Contact>>;
    /// `true` when a row was actually removed.
    async fn delete(&self, owner: i64, id: i64) -> AppResult<bool>;
    /// Case-insensitive substring match on first name, last name or email.
    async fn search(&self, owner: i64, query: &str) -> AppResult<Vec<Contact>>;
}

#[derive(Clone)]
pub struct PgContactStore {
    db: PgPool,
}

impl PgContactStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const CONTACT_COLUMNS: &str =
    "id, user_id, first_name, last_name, email, phone, birthday, note, created_at";

/// Escapes LIKE metacharacters so the query text matches literally.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    out.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn create(&self, owner: i64, new: NewContact) -> AppResult<Contact> {
        let contact = sqlx::query_as::<_, Contact>(&format!(
            r#"
            INSERT INTO contacts (user_id, first_name, last_name, email, phone, birthday, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(owner)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.birthday)
        .bind(&new.note)
        .fetch_one(&self.db)
        .await?;
        Ok(contact)
    }

    async fn list(&self, owner: i64, page: Page) -> AppResult<Vec<Contact>> {
        let rows = sqlx::query_as::<_, Contact>(&format!(
            r#"
            SELECT {CONTACT_COLUMNS}
            FROM contacts
            WHERE user_id = $1
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_all(&self, owner: i64) -> AppResult<Vec<Contact>> {
        let rows = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE user_id = $1 ORDER BY id ASC"
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, owner: i64, id: i64) -> AppResult<Option<Contact>> {
        let contact = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        Ok(contact)
    }

    async fn update(&self, owner: i64, id: i64, patch: ContactPatch) -> AppResult<Option<Contact>> {
        let (note_set, note) = match patch.note {
            Some(v) => (true, v),
            None => (false, None),
        };
        let contact = sqlx::query_as::<_, Contact>(&format!(
            r#"
            UPDATE contacts SET
                first_name = COALESCE($3, first_name),
                last_name  = COALESCE($4, last_name),
                email      = COALESCE($5, email),
                phone      = COALESCE($6, phone),
                birthday   = COALESCE($7, birthday),
                note       = CASE WHEN $8 THEN $9 ELSE note END
            WHERE id = $1 AND user_id = $2
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.email)
        .bind(&patch.phone)
        .bind(patch.birthday)
        .bind(note_set)
        .bind(note)
        .fetch_optional(&self.db)
        .await?;
        Ok(contact)
    }

    async fn delete(&self, owner: i64, id: i64) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM contacts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn search(&self, owner: i64, query: &str) -> AppResult<Vec<Contact>> {
        let pattern = like_pattern(query);
        let rows = sqlx::query_as::<_, Contact>(&format!(
            r#"
            SELECT {CONTACT_COLUMNS}
            FROM contacts
            WHERE user_id = $1
              AND (first_name ILIKE $2 ESCAPE '\'
                   OR last_name ILIKE $2 ESCAPE '\'
                   OR email ILIKE $2 ESCAPE '\')
            ORDER BY id ASC
            "#
        ))
        .bind(owner)
        .bind(&pattern)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

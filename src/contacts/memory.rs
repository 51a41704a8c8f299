use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::repo::ContactStore;
use super::repo_types::{Contact, ContactPatch, NewContact, Page};
use crate::errors::AppResult;

/// In-process `ContactStore` for tests. Filters on owner the same way the
/// SQL does: inside the predicate, never after fetching.
#[derive(Default)]
pub struct MemoryContactStore {
    rows: Mutex<Vec<Contact>>,
    next_id: Mutex<i64>,
}

impl MemoryContactStore {
    /// Rows regardless of owner.
    pub fn len(&self) -> usize {
        self.rows.lock().expect("contact store poisoned").len()
    }

    fn select<P>(&self, pred: P) -> Vec<Contact>
    where
        P: Fn(&Contact) -> bool,
    {
        let rows = self.rows.lock().expect("contact store poisoned");
        rows.iter().filter(|c| pred(c)).cloned().collect()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn create(&self, owner: i64, new: NewContact) -> AppResult<Contact> {
        let id = {
            let mut next = self.next_id.lock().expect("contact store poisoned");
            *next += 1;
            *next
        };
        let contact = Contact {
            id,
            user_id: owner,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            birthday: new.birthday,
            note: new.note,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows
            .lock()
            .expect("contact store poisoned")
            .push(contact.clone());
        Ok(contact)
    }

    async fn list(&self, owner: i64, page: Page) -> AppResult<Vec<Contact>> {
        Ok(self
            .select(|c| c.user_id == owner)
            .into_iter()
            .skip(page.skip.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .collect())
    }

    async fn list_all(&self, owner: i64) -> AppResult<Vec<Contact>> {
        Ok(self.select(|c| c.user_id == owner))
    }

    async fn get(&self, owner: i64, id: i64) -> AppResult<Option<Contact>> {
        Ok(self
            .select(|c| c.id == id && c.user_id == owner)
            .into_iter()
            .next())
    }

    async fn update(&self, owner: i64, id: i64, patch: ContactPatch) -> AppResult<Option<Contact>> {
        let mut rows = self.rows.lock().expect("contact store poisoned");
        let Some(c) = rows.iter_mut().find(|c| c.id == id && c.user_id == owner) else {
            return Ok(None);
        };
        patch.apply(c);
        Ok(Some(c.clone()))
    }

    async fn delete(&self, owner: i64, id: i64) -> AppResult<bool> {
        let mut rows = self.rows.lock().expect("contact store poisoned");
        let before = rows.len();
        rows.retain(|c| !(c.id == id && c.user_id == owner));
        Ok(rows.len() < before)
    }

    async fn search(&self, owner: i64, query: &str) -> AppResult<Vec<Contact>> {
        Ok(self.select(|c| {
            c.user_id == owner
                && (contains_ci(&c.first_name, query)
                    || contains_ci(&c.last_name, query)
                    || contains_ci(&c.email, query))
        }))
    }
}

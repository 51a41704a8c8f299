use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// Contact row. `user_id` is the owner and is only ever set by the server.
#[derive(Debug, Clone, FromRow)]
pub struct Contact {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: Date, // only month and day matter for reminders
    pub note: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Fields a caller may supply on create; the owner is not one of them.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: Date,
    pub note: Option<String>,
}

/// Partial update: `None` leaves the column untouched.
/// `note: Some(None)` clears the note.
#[derive(Debug, Clone, Default)]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<Date>,
    pub note: Option<Option<String>>,
}

impl ContactPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.birthday.is_none()
            && self.note.is_none()
    }

    pub fn apply(self, c: &mut Contact) {
        if let Some(v) = self.first_name {
            c.first_name = v;
        }
        if let Some(v) = self.last_name {
            c.last_name = v;
        }
        if let Some(v) = self.email {
            c.email = v;
        }
        if let Some(v) = self.phone {
            c.phone = v;
        }
        if let Some(v) = self.birthday {
            c.birthday = v;
        }
        if let Some(v) = self.note {
            c.note = v;
        }
    }
}

/// Offset pagination, insertion order.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

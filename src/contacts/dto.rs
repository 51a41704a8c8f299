use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, OffsetDateTime};

use super::repo_types::Contact;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Body of `POST /contacts`. A `user_id` sent by the client is not a field
/// here and is dropped during deserialization.
#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(with = "iso_date")]
    pub birthday: Date,
    #[serde(default, alias = "extra")]
    pub note: Option<String>,
}

/// Body of `PUT`/`PATCH /contacts/:id`. Only fields present are changed.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateContactRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub birthday: Option<Date>,
    #[serde(default, alias = "extra", deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct ContactOut {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(with = "iso_date")]
    pub birthday: Date,
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Contact> for ContactOut {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            phone: c.phone,
            birthday: c.birthday,
            note: c.note,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}
fn default_limit() -> u32 {
    100
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

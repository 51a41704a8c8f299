use time::Date;

use super::{
    birthdays::is_upcoming,
    dto::{CreateContactRequest, UpdateContactRequest},
    repo::ContactStore,
    repo_types::{Contact, ContactPatch, NewContact},
};
use crate::{
    auth::services::{is_valid_email, normalize_email},
    errors::{AppError, AppResult},
};

fn required(field: &str, value: String) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn contact_email(value: String) -> AppResult<String> {
    let email = normalize_email(&value);
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    Ok(email)
}

impl TryFrom<CreateContactRequest> for NewContact {
    type Error = AppError;

    fn try_from(req: CreateContactRequest) -> AppResult<Self> {
        Ok(Self {
            first_name: required("first_name", req.first_name)?,
            last_name: required("last_name", req.last_name)?,
            email: contact_email(req.email)?,
            phone: required("phone", req.phone)?,
            birthday: req.birthday,
            note: req.note,
        })
    }
}

impl TryFrom<UpdateContactRequest> for ContactPatch {
    type Error = AppError;

    fn try_from(req: UpdateContactRequest) -> AppResult<Self> {
        Ok(Self {
            first_name: req.first_name.map(|v| required("first_name", v)).transpose()?,
            last_name: req.last_name.map(|v| required("last_name", v)).transpose()?,
            email: req.email.map(contact_email).transpose()?,
            phone: req.phone.map(|v| required("phone", v)).transpose()?,
            birthday: req.birthday,
            note: req.note,
        })
    }
}

/// Owned contacts whose birthday falls in the window starting at `today`.
pub async fn upcoming_birthdays(
    store: &dyn ContactStore,
    owner: i64,
    today: Date,
) -> AppResult<Vec<Contact>> {
    let contacts = store.list_all(owner).await?;
    Ok(contacts
        .into_iter()
        .filter(|c| is_upcoming(c.birthday, today))
        .collect())
}

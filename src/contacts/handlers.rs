use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    errors::{AppError, AppResult},
    state::AppState,
};

use super::dto::{ContactOut, CreateContactRequest, Pagination, SearchParams, UpdateContactRequest};
use super::repo_types::{Contact, ContactPatch, NewContact, Page};
use super::services;

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/search", get(search_contacts))
        .route("/contacts/birthdays/upcoming", get(upcoming_birthdays))
        .route(
            "/contacts/:id",
            get(get_contact)
                .put(update_contact)
                .patch(update_contact)
                .delete(delete_contact),
        )
}

fn to_out(contacts: Vec<Contact>) -> Vec<ContactOut> {
    contacts.into_iter().map(ContactOut::from).collect()
}

#[instrument(skip(state, body))]
pub async fn create_contact(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateContactRequest>,
) -> AppResult<(StatusCode, Json<ContactOut>)> {
    let new = NewContact::try_from(body)?;
    let contact = state.contacts.create(user_id, new).await?;
    info!(user_id, contact_id = contact.id, "contact created");
    Ok((StatusCode::CREATED, Json(contact.into())))
}

#[instrument(skip(state))]
pub async fn list_contacts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> AppResult<Json<Vec<ContactOut>>> {
    let page = Page {
        skip: i64::from(p.skip),
        limit: i64::from(p.limit),
    };
    let contacts = state.contacts.list(user_id, page).await?;
    Ok(Json(to_out(contacts)))
}

#[instrument(skip(state))]
pub async fn get_contact(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ContactOut>> {
    state
        .contacts
        .get(user_id, id)
        .await?
        .map(|c| Json(c.into()))
        .ok_or(AppError::NotFound("Contact not found"))
}

#[instrument(skip(state, body))]
pub async fn update_contact(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateContactRequest>,
) -> AppResult<Json<ContactOut>> {
    let patch = ContactPatch::try_from(body)?;
    if patch.is_empty() {
        let contact = state
            .contacts
            .get(user_id, id)
            .await?
            .ok_or(AppError::NotFound("Contact not found"))?;
        return Ok(Json(contact.into()));
    }

    let contact = state
        .contacts
        .update(user_id, id, patch)
        .await?
        .ok_or(AppError::NotFound("Contact not found"))?;
    info!(user_id, contact_id = id, "contact updated");
    Ok(Json(contact.into()))
}

#[instrument(skip(state))]
pub async fn delete_contact(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let deleted = state.contacts.delete(user_id, id).await?;
    if deleted {
        info!(user_id, contact_id = id, "contact deleted");
    }
    Ok(Json(deleted))
}

#[instrument(skip(state))]
pub async fn search_contacts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<ContactOut>>> {
    let contacts = state.contacts.search(user_id, &params.query).await?;
    Ok(Json(to_out(contacts)))
}

#[instrument(skip(state))]
pub async fn upcoming_birthdays(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<ContactOut>>> {
    let today = OffsetDateTime::now_utc().date();
    let contacts = services::upcoming_birthdays(state.contacts.as_ref(), user_id, today).await?;
    Ok(Json(to_out(contacts)))
}

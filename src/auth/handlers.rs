use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AvatarRequest, LoginRequest, PublicUser, RefreshRequest, RegisterRequest, TokenResponse},
        extractors::AuthUser,
        notify::verification_link,
        password::{hash_password, verify_password},
        repo_types::NewUser,
        services::{issue_tokens, parse_avatar_url, validate_registration},
    },
    errors::{AppError, AppResult},
    rate_limit::Throttled,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/refresh", post(refresh))
        .route("/users/verify/:token", get(verify_email))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/avatar", put(update_avatar))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    validate_registration(&mut payload).inspect_err(|e| warn!(error = %e, "invalid registration"))?;

    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }
    if state.users.find_by_username(&payload.username).await?.is_some() {
        warn!(username = %payload.username, "username already taken");
        return Err(AppError::Conflict("Username already taken".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .users
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await?;

    let token = state.jwt.sign_verify(user.id, &user.email)?;
    let link = verification_link(&state.config.server.public_base_url, &token);
    // Registration stands even if the link cannot be delivered.
    if let Err(e) = state.notifier.send_verification(&user.email, &link).await {
        warn!(error = %e, user_id = user.id, "verification notice failed");
    }

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let username = payload.username.trim();
    let Some(user) = state.users.find_by_username(username).await? else {
        warn!(%username, "login unknown user");
        return Err(AppError::Unauthenticated("Invalid credentials"));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::Unauthenticated("Invalid credentials"));
    }
    if !user.is_active {
        warn!(user_id = user.id, "login on inactive account");
        return Err(AppError::Unauthenticated("Invalid credentials"));
    }

    let tokens = issue_tokens(&state.jwt, &user)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(tokens))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let claims = state.jwt.verify_refresh(&payload.refresh_token)?;

    let user = match state.users.find_by_id(claims.sub).await? {
        Some(u) if u.is_active => u,
        _ => {
            warn!(user_id = claims.sub, "refresh for missing or inactive user");
            return Err(AppError::Unauthenticated("User not found"));
        }
    };

    Ok(Json(issue_tokens(&state.jwt, &user)?))
}

#[instrument(skip(state, token))]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<PublicUser>> {
    let claims = state.jwt.verify_email_token(&token)?;
    let user = state
        .users
        .mark_verified(claims.sub)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    info!(user_id = user.id, "email verified");
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AvatarRequest>,
) -> AppResult<Json<PublicUser>> {
    let url = parse_avatar_url(&payload.avatar_url)
        .ok_or_else(|| AppError::BadRequest("avatar_url must be an http(s) URL".into()))?;

    let user = state
        .users
        .set_avatar(user_id, url.as_str())
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    info!(user_id, "avatar updated");
    Ok(Json(user.into()))
}

#[instrument(skip(_throttled, state))]
pub async fn get_me(
    _throttled: Throttled,
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;
    Ok(Json(user.into()))
}

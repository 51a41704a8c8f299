//! Shared fixtures for router-level tests.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::{jwt::test_config, memory::MemoryUserStore, notify::testing::RecordingNotifier},
    config::{AppConfig, ServerConfig},
    contacts::memory::MemoryContactStore,
    state::AppState,
};

pub struct TestApp {
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub contacts: Arc<MemoryContactStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig {
            database_url: "postgres://unused".into(),
            database_max_connections: 1,
            jwt: test_config("test-secret", "test-issuer", "test-aud"),
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                public_base_url: "http://localhost:8080".into(),
                me_rate_limit_per_minute: 5,
            },
        };
        let users = Arc::new(MemoryUserStore::default());
        let contacts = Arc::new(MemoryContactStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::from_parts(config, users.clone(), contacts.clone(), notifier.clone());
        Self {
            state,
            users,
            contacts,
            notifier,
        }
    }

    pub fn router(&self) -> Router {
        build_app(self.state.clone())
    }
}

/// Access token for `user_id` signed with the app's keys.
pub fn bearer(state: &AppState, user_id: i64) -> String {
    state
        .jwt
        .sign_access(user_id, &format!("user{user_id}@example.com"))
        .expect("sign access")
}

/// Sends one request and decodes the JSON response (`Null` when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, _, json) = send_as(app, None, method, uri, token, body).await;
    (status, json)
}

/// Like [`send`], but as if the connection came from `peer`, and keeps the
/// response headers.
pub async fn send_as(
    app: &Router,
    peer: Option<SocketAddr>,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(addr) = peer {
        req = req.extension(ConnectInfo(addr));
    }
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string())),
        None => req.body(Body::empty()),
    }
    .expect("request builds");

    let resp = app.clone().oneshot(req).await.expect("infallible");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, headers, json)
}

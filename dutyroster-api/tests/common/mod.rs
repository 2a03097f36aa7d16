//! Common test utilities for API tests
//!
//! Each `TestContext` owns a fresh in-memory store and a router built over
//! it, so tests never share state and need no external services.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use dutyroster_api::app::{build_router, AppState};
use dutyroster_api::config::Config;
use dutyroster_shared::auth::jwt::issue_token;
use dutyroster_shared::hierarchy::Scope;
use dutyroster_shared::models::user::{CreateUser, Role, User};
use dutyroster_shared::store::memory::MemoryStore;
use dutyroster_shared::store::UserStore;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
    pub config: Config,
}

/// A seeded user and a valid token for it
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestContext {
    /// Creates a new test context over an empty store
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgresql://unused/dutyroster_test".to_string()),
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            _ => None,
        })
        .expect("test config");

        let store = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(store.clone(), config.clone()));

        Self { store, app, config }
    }

    /// Inserts a user directly into the store and issues a token for it
    pub async fn user(&self, username: &str, role: Role, scope: Scope) -> TestUser {
        let rank = if role.is_admin() { "LT" } else { "PVT" };
        let user = self
            .store
            .insert_user(
                CreateUser::new(username, "not-a-real-hash", role, scope)
                    .with_profile(username, "Doe", rank),
            )
            .await
            .expect("insert user");
        let token = issue_token(user.id, user.role, JWT_SECRET, 1).expect("issue token");

        TestUser { user, token }
    }

    /// Sends a request and returns the status and parsed JSON body
    ///
    /// An empty body is returned as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.dispatch(request).await
    }

    /// Sends a raw body with the given content type
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        content_type: &str,
        body: &'static str,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("build request");

        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.expect("route request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), Some(body)).await
    }
}

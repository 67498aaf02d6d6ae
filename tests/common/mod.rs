// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use mindcare::config::Config;
use mindcare::db::{FirestoreDb, MemoryStore, ProgressStore};
use mindcare::middleware::auth::create_jwt;
use mindcare::models::User;
use mindcare::routes::create_router;
use mindcare::services::{ActivityCatalog, RunRegistry};
use mindcare::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Build an app around the given store with the built-in catalog.
#[allow(dead_code)]
pub fn create_test_app_with_store(store: Arc<dyn ProgressStore>) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Config::test_default(),
        store,
        catalog: ActivityCatalog::builtin()
            .expect("built-in catalog should load")
            .clone(),
        runs: RunRegistry::new(),
    });

    (create_router(state.clone()), state)
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_store(Arc::new(MemoryStore::new()))
}

/// Create a user directly in the store and return a session token for it.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, username: &str) -> String {
    let user = User::new(username, "2026-01-01T00:00:00Z");
    state.store.create_user(&user).await.unwrap();
    create_jwt(&user.user_id, &state.config.jwt_signing_key).unwrap()
}

/// Build a request with a bearer token and no body.
#[allow(dead_code)]
pub fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

//! Test utilities for integration tests
#![allow(dead_code)]
use std::sync::{Arc, RwLock};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::Request,
};
use tempfile::TempDir;

use multichat::api::AppState;
use multichat::api::app;
use multichat::core::AppConfig;
use multichat::core::db::{async_db, initialize_db};

pub const TEST_USER: &str = "user_test_1";
pub const OTHER_USER: &str = "user_test_2";

/// Creates a test application router backed by a fresh database in a
/// temporary directory. Keep the returned `TempDir` alive for the
/// duration of the test.
pub async fn test_app() -> (Router, TempDir) {
    test_app_with_config(|_| {}).await
}

/// Same as `test_app` but with provider hosts pointed at a mock server.
pub async fn test_app_with_hosts(openai_host: &str, gemini_host: &str) -> (Router, TempDir) {
    let openai_host = openai_host.to_string();
    let gemini_host = gemini_host.to_string();
    test_app_with_config(move |config| {
        config.openai_api_hostname = openai_host;
        config.gemini_api_hostname = gemini_host;
    })
    .await
}

pub async fn test_app_with_config(customize: impl FnOnce(&mut AppConfig)) -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = AppConfig::new(dir.path().to_str().unwrap());
    config.openai_api_key = String::from("test-openai-key");
    config.gemini_api_key = String::from("test-gemini-key");
    customize(&mut config);

    std::fs::create_dir_all(&config.db_path).expect("Failed to create db directory");
    let db = async_db(&config.db_path)
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();

    let app_state = AppState::new(db, config);
    (app(Arc::new(RwLock::new(app_state))), dir)
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf-8")
}

pub async fn body_to_json(body: Body) -> serde_json::Value {
    serde_json::from_str(&body_to_string(body).await).expect("Body is not json")
}

/// JSON request as a signed in user. `user` of `None` sends the
/// request as a guest.
pub fn json_request(
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::empty()).unwrap()
}

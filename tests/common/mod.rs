//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt;

use bank_api::api::{self, AppState};
use bank_api::auth::JwtKeys;
use bank_api::{db, InMemoryLedgerStore};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Router over a fresh in-memory store
pub fn setup_test_app() -> (Router, InMemoryLedgerStore) {
    let store = InMemoryLedgerStore::new(Duration::from_secs(5));
    let state = AppState::new(Arc::new(store.clone()), JwtKeys::new(TEST_SECRET, 300));
    (api::create_router(state), store)
}

/// Connect to the test database and make sure the schema exists
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::init_schema(&pool).await.expect("Failed to create schema");

    pool
}

/// Send one request through the router and decode the JSON body
///
/// Non-JSON bodies come back as a JSON string.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-jwt-token", token);
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    (status, value)
}

/// A created account as seen by a client
#[derive(Debug, Clone)]
pub struct TestAccount {
    pub id: i64,
    pub number: i64,
    pub token: String,
}

/// Create an account over HTTP and resolve its id from the account list
pub async fn create_account(app: &Router, first_name: &str) -> TestAccount {
    let (status, body) = send(
        app,
        "POST",
        "/account",
        None,
        Some(serde_json::json!({
            "firstName": first_name,
            "lastName": "Tester",
            "password": "secret-pw"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "account creation failed: {body}");

    let number = body["number"].as_i64().unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let (_, accounts) = send(app, "GET", "/account", None, None).await;
    let id = accounts
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["number"].as_i64() == Some(number))
        .and_then(|a| a["id"].as_i64())
        .unwrap();

    TestAccount { id, number, token }
}

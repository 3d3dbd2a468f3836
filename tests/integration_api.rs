//! API Integration Tests
//!
//! Drive the full router, middleware included, over the in-memory store.

use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{create_account, send, setup_test_app};

#[tokio::test]
async fn test_root_and_health() {
    let (app, _) = setup_test_app();

    let (status, body) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello there from server!!");

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_deposit_transfer_withdraw_e2e() {
    let (app, store) = setup_test_app();
    let alice = create_account(&app, "Alice").await;
    let bob = create_account(&app, "Bob").await;

    // 1. Deposit 500 into Alice
    let (status, body) = send(
        &app,
        "POST",
        &format!("/deposit/{}", alice.id),
        Some(&alice.token),
        Some(json!({ "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Deposit failed: {body}");
    assert_eq!(body, json!({ "number": alice.number, "oldBalance": 0, "newBalance": 500 }));

    // 2. Transfer 200 to Bob
    let (status, body) = send(
        &app,
        "POST",
        &format!("/transfer/{}", alice.id),
        Some(&alice.token),
        Some(json!({ "toAccount": bob.number, "amount": 200 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Transfer failed: {body}");
    assert_eq!(body["number"], alice.number);
    assert_eq!(body["oldBalance"], 500);
    assert_eq!(body["newBalance"], 300);
    assert_eq!(body["toAccount"], bob.number);
    assert_eq!(body["toOldBalance"], 0);
    assert_eq!(body["toNewBalance"], 200);

    // 3. Withdraw more than is left
    let (status, body) = send(
        &app,
        "POST",
        &format!("/withdraw/{}", alice.id),
        Some(&alice.token),
        Some(json!({ "amount": 400 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "insufficient_balance");

    // 4. Balances as seen through the API
    let (status, body) = send(
        &app,
        "GET",
        &format!("/account/{}", alice.id),
        Some(&alice.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 300);
    assert_eq!(body["firstName"], "Alice");
    assert!(body.get("password").is_none());
    assert!(body.get("credentialHash").is_none());

    let bob_uri = format!("/account/{}", bob.id);
    let (_, body) = send(&app, "GET", &bob_uri, Some(&bob.token), None).await;
    assert_eq!(body["balance"], 200);

    assert_eq!(store.total_balance().unwrap(), 500);
}

#[tokio::test]
async fn test_self_transfer_rejected() {
    let (app, _) = setup_test_app();
    let alice = create_account(&app, "Alice").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/transfer/{}", alice.id),
        Some(&alice.token),
        Some(json!({ "toAccount": alice.number, "amount": 50 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "same_account_transfer");
}

#[tokio::test]
async fn test_transfer_to_unknown_account_is_not_found() {
    let (app, _) = setup_test_app();
    let alice = create_account(&app, "Alice").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/transfer/{}", alice.id),
        Some(&alice.token),
        Some(json!({ "toAccount": -1, "amount": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "account_not_found");
}

#[tokio::test]
async fn test_invalid_amount_rejected() {
    let (app, _) = setup_test_app();
    let alice = create_account(&app, "Alice").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/deposit/{}", alice.id),
        Some(&alice.token),
        Some(json!({ "amount": 0 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_amount");
}

#[tokio::test]
async fn test_malformed_body_uses_error_shape() {
    let (app, store) = setup_test_app();
    let alice = create_account(&app, "Alice").await;
    let bob = create_account(&app, "Bob").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/deposit/{}", alice.id),
        Some(&alice.token),
        Some(json!({ "amount": "ten" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_request");
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        &format!("/transfer/{}", alice.id),
        Some(&alice.token),
        Some(json!({ "amount": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_request");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/withdraw/{}", bob.id),
        Some(&bob.token),
        Some(json!([1, 2, 3])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_request");

    assert_eq!(store.total_balance().unwrap(), 0);
}

// =========================================================================
// Session tokens
// =========================================================================

#[tokio::test]
async fn test_token_for_other_account_forbidden() {
    let (app, store) = setup_test_app();
    let alice = create_account(&app, "Alice").await;
    let bob = create_account(&app, "Bob").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/withdraw/{}", bob.id),
        Some(&alice.token),
        Some(json!({ "amount": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Permission Denied");
    assert_eq!(store.total_balance().unwrap(), 0);
}

#[tokio::test]
async fn test_missing_or_bad_token_forbidden() {
    let (app, _) = setup_test_app();
    let alice = create_account(&app, "Alice").await;
    let uri = format!("/account/{}", alice.id);

    let (status, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", &uri, Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/account/abc", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/account/999999", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login() {
    let (app, _) = setup_test_app();
    let alice = create_account(&app, "Alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "number": alice.number, "password": "secret-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["number"], alice.number);

    // The fresh token works on protected routes
    let token = body["token"].as_str().unwrap().to_string();
    let uri = format!("/account/{}", alice.id);
    let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "number": alice.number, "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "invalid_credentials");
}

#[tokio::test]
async fn test_deleted_account_is_gone() {
    let (app, _) = setup_test_app();
    let alice = create_account(&app, "Alice").await;
    let uri = format!("/account/{}", alice.id);

    let (status, body) = send(&app, "DELETE", &uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": alice.id }));

    let (status, _) = send(
        &app,
        "POST",
        &format!("/deposit/{}", alice.id),
        Some(&alice.token),
        Some(json!({ "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, accounts) = send(&app, "GET", "/account", None, None).await;
    assert!(accounts.as_array().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_http_deposits() {
    let (app, _) = setup_test_app();
    let alice = create_account(&app, "Alice").await;

    let tasks: Vec<_> = (0..25)
        .map(|_| {
            let app = app.clone();
            let alice = alice.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    "POST",
                    &format!("/deposit/{}", alice.id),
                    Some(&alice.token),
                    Some(json!({ "amount": 1 })),
                )
                .await
                .0
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let uri = format!("/account/{}", alice.id);
    let (_, body) = send(&app, "GET", &uri, Some(&alice.token), None).await;
    assert_eq!(body["balance"], 25);
}

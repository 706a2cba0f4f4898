//! Account endpoint integration tests.

mod common;

use common::TestHarness;
use serde_json::json;
use tryfit_core::UserId;

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn create_account_success() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/accounts")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({}))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["credits"], 0);
    assert_eq!(body["free_trials_used"], 0);
    assert_eq!(body["free_trials_limit"], 3);
    assert_eq!(body["free_trials_remaining"], 3);
    assert_eq!(body["user_id"], harness.test_user_id.to_string());
}

#[tokio::test]
async fn create_account_is_idempotent() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.grant_credits(5).await;

    // Re-registering must not reset the balance or the trial allowance
    let response = harness
        .server
        .post("/v1/accounts")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({}))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["credits"], 5);
}

#[tokio::test]
async fn create_account_attaches_email() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/accounts")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "email": "shopper@example.com" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["email"], "shopper@example.com");
}

#[tokio::test]
async fn create_account_rejects_taken_email() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/v1/accounts")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "email": "shopper@example.com" }))
        .await
        .assert_status_ok();

    let other = UserId::generate();
    let response = harness
        .server
        .post("/v1/accounts")
        .add_header("authorization", harness.auth_header_for(&other))
        .json(&json!({ "email": "shopper@example.com" }))
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_account_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.post("/v1/accounts").json(&json!({})).await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn garbage_token_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/accounts")
        .add_header("authorization", "Bearer not-a-jwt")
        .json(&json!({}))
        .await;

    response.assert_status_unauthorized();
}

// ============================================================================
// Me
// ============================================================================

#[tokio::test]
async fn get_account_me() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .get("/v1/accounts/me")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user_id"], harness.test_user_id.to_string());
}

#[tokio::test]
async fn get_account_me_before_registering_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/accounts/me")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}

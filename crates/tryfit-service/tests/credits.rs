//! Credit balance, ledger history, and admin grant integration tests.

mod common;

use common::{TestHarness, TEST_ADMIN_KEY};
use serde_json::json;

// ============================================================================
// Balance
// ============================================================================

#[tokio::test]
async fn get_balance_success() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["credits"], 0);
    assert_eq!(body["free_trials_used"], 0);
    assert_eq!(body["free_trials_limit"], 3);
}

#[tokio::test]
async fn get_balance_without_account_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn get_balance_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/credits/balance").await;

    response.assert_status_unauthorized();
}

// ============================================================================
// Admin grants
// ============================================================================

#[tokio::test]
async fn admin_grant_increases_balance() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .post("/v1/admin/credits")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&json!({
            "account_id": harness.test_user_id.to_string(),
            "amount": 25,
            "reason": "goodwill"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["new_balance"], 25);
    assert_eq!(body["duplicate"], false);

    let balance = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = balance.json();
    assert_eq!(body["credits"], 25);
}

#[tokio::test]
async fn admin_grant_requires_key() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let body = json!({
        "account_id": harness.test_user_id.to_string(),
        "amount": 5
    });

    harness
        .server
        .post("/v1/admin/credits")
        .json(&body)
        .await
        .assert_status_unauthorized();

    harness
        .server
        .post("/v1/admin/credits")
        .add_header("x-admin-key", "wrong-key")
        .json(&body)
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn admin_grant_rejects_nonpositive_amount() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .post("/v1/admin/credits")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&json!({
            "account_id": harness.test_user_id.to_string(),
            "amount": 0
        }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn admin_grant_unknown_account_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/admin/credits")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&json!({
            "account_id": tryfit_core::UserId::generate().to_string(),
            "amount": 5
        }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn admin_grant_with_order_id_is_idempotent() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let body = json!({
        "account_id": harness.test_user_id.to_string(),
        "amount": 10,
        "order_id": "grant_2026_08"
    });

    let first = harness
        .server
        .post("/v1/admin/credits")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&body)
        .await;
    first.assert_status_ok();
    let first: serde_json::Value = first.json();
    assert_eq!(first["duplicate"], false);
    assert_eq!(first["new_balance"], 10);

    let second = harness
        .server
        .post("/v1/admin/credits")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&body)
        .await;
    second.assert_status_ok();
    let second: serde_json::Value = second.json();
    assert_eq!(second["duplicate"], true);
    assert_eq!(second["new_balance"], 10);
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn history_orders_newest_first() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.grant_credits(1).await;
    harness.grant_credits(2).await;
    harness.grant_credits(3).await;

    let response = harness
        .server
        .get("/v1/credits/history")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["amount"], 3);
    assert_eq!(entries[1]["amount"], 2);
    assert_eq!(entries[2]["amount"], 1);
    assert_eq!(entries[0]["reason"], "adjustment");
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn history_respects_limit_and_offset() {
    let harness = TestHarness::new();
    harness.create_account().await;
    for amount in 1..=3 {
        harness.grant_credits(amount).await;
    }

    let response = harness
        .server
        .get("/v1/credits/history?limit=2")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["entries"].as_array().unwrap().len(), 2);
    assert_eq!(body["has_more"], true);

    let response = harness
        .server
        .get("/v1/credits/history?limit=2&offset=2")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["amount"], 1);
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn history_balance_chain_is_consistent() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.grant_credits(10).await;
    harness.grant_credits(5).await;

    let response = harness
        .server
        .get("/v1/credits/history")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    let entries = body["entries"].as_array().unwrap();

    // Newest first: 10 -> 15
    assert_eq!(entries[0]["balance_before"], 10);
    assert_eq!(entries[0]["balance_after"], 15);
    assert_eq!(entries[1]["balance_before"], 0);
    assert_eq!(entries[1]["balance_after"], 10);
}

#[tokio::test]
async fn history_without_account_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/credits/history")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn admin_routes_reject_user_tokens() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .get("/v1/admin/providers")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_unauthorized();
}

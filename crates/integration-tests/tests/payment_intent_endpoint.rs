//! Contract tests for the public payment authorization endpoint.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use fungal_flux_integration_tests::TestContext;

#[tokio::test]
async fn non_post_methods_are_rejected_with_405() {
    let mut ctx = TestContext::new();
    let (status, _) = ctx.request("GET", "/api/payment-intent", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn malformed_json_body_is_a_400() {
    let mut ctx = TestContext::new();
    let (status, body) = ctx
        .post("/api/payment-intent", json!("{not json"))
        .await;
    // A JSON string body parses, but carries no amount
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid amount");

    // Raw garbage bytes fail the JSON parse itself
    let mut raw = TestContext::new();
    let (status, body) = raw
        .request_raw("POST", "/api/payment-intent", "{not json")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON payload");
}

#[tokio::test]
async fn empty_and_invalid_amounts_are_400() {
    let mut ctx = TestContext::new();

    let (status, body) = ctx.post("/api/payment-intent", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid amount");

    for amount in [json!(49), json!(-100), json!("3698"), json!(null)] {
        let (status, body) = ctx
            .post("/api/payment-intent", json!({ "amount": amount }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {amount}");
        assert_eq!(body["error"], "Invalid amount");
    }
}

#[tokio::test]
async fn valid_request_returns_secret_and_intent_id() {
    let mut ctx = TestContext::new();
    let (status, body) = ctx
        .post(
            "/api/payment-intent",
            json!({
                "amount": 3698,
                "currency": "usd",
                "metadata": { "total_display": "$36.98" }
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paymentIntentId"], "pi_test_123");
    assert_eq!(body["clientSecret"], "pi_test_123_secret");
    assert_eq!(
        ctx.gateway.last_amount.lock().unwrap().unwrap(),
        3698
    );
}

#[tokio::test]
async fn minimum_amount_is_accepted() {
    let mut ctx = TestContext::new();
    let (status, _) = ctx
        .post("/api/payment-intent", json!({ "amount": 50 }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn processor_failure_is_a_500_with_message() {
    let mut ctx = TestContext::new();
    ctx.gateway
        .fail_create
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let (status, body) = ctx
        .post("/api/payment-intent", json!({ "amount": 3698 }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to create payment intent");
    assert!(body["message"].is_string());
}

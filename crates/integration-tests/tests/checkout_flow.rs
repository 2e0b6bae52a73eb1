//! End-to-end checkout flow tests against the in-process router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use fungal_flux_integration_tests::{TestContext, valid_address_json};

/// Walk a context to the Payment step with one Lion's Mane kit (24.99).
async fn reach_payment(ctx: &mut TestContext) {
    let kit = ctx.product_id("Lion's Mane Grow Kit");

    let (status, _) = ctx
        .post("/cart/add", json!({ "product_id": kit, "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.get("/checkout").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "shipping");

    let (status, body) = ctx
        .post("/checkout/shipping", valid_address_json("Mora Spore"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "billing");

    let (status, body) = ctx
        .post("/checkout/billing", json!({ "use_same_as_shipping": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "payment");
    assert!(body["payment"]["client_secret"].is_string());
}

#[tokio::test]
async fn full_checkout_persists_exactly_one_order() {
    let mut ctx = TestContext::new();
    reach_payment(&mut ctx).await;

    // Authorized for subtotal 2499 + shipping 999 + tax 200 = 3698
    let (_, body) = ctx.get("/checkout").await;
    assert_eq!(body["totals"]["subtotal"], 2499);
    assert_eq!(body["totals"]["shipping"], 999);
    assert_eq!(body["totals"]["tax"], 200);
    assert_eq!(body["totals"]["total"], 3698);
    assert_eq!(body["payment"]["amount"], 3698);
    assert_eq!(body["payment"]["publishable_key"], "pk_test_visible");

    let (status, body) = ctx
        .post("/checkout/payment", json!({ "card_token": "tok_visa" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "review");
    assert_eq!(body["paid"], true);

    let (status, order) = ctx.post("/checkout/order", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["subtotal"], 2499);
    assert_eq!(order["shipping_cost"], 999);
    assert_eq!(order["tax_amount"], 200);
    assert_eq!(order["total_amount"], 3698);
    assert_eq!(order["payment_intent_id"], "pi_test_123");
    assert_eq!(order["payment_method_last4"], "4242");
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(order["items"][0]["unit_price"], 2499);

    let order_number = order["order_number"].as_str().unwrap();
    assert!(order_number.starts_with("FF-"), "{order_number}");
    assert_eq!(order_number.len(), "FF-20240615-0481".len());

    assert_eq!(ctx.store.order_count(), 1);

    // Success tears the session down: cart emptied, checkout gone
    let (_, cart) = ctx.get("/cart").await;
    assert_eq!(cart["item_count"], 0);
    let (status, body) = ctx.get("/checkout").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "cart_empty");

    // The persisted order is readable for the confirmation page
    let id = order["id"].as_str().unwrap().to_string();
    let (status, fetched) = ctx.get(&format!("/orders/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["order_number"], order["order_number"]);
}

#[tokio::test]
async fn persistence_failure_leaves_cart_and_checkout_intact() {
    let mut ctx = TestContext::new();
    reach_payment(&mut ctx).await;

    let (status, _) = ctx
        .post("/checkout/payment", json!({ "card_token": "tok_visa" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    ctx.store
        .fail_create_order
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let (status, body) = ctx.post("/checkout/order", json!({})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "order_persistence_failed");
    assert_eq!(body["retryable"], true);
    assert_eq!(ctx.store.order_count(), 0);

    // Cart still has its line; checkout still at Review with payment intact
    let (_, cart) = ctx.get("/cart").await;
    assert_eq!(cart["item_count"], 1);
    let (status, checkout) = ctx.get("/checkout").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checkout["step"], "review");
    assert_eq!(checkout["paid"], true);

    // Retry without re-entering anything succeeds
    ctx.store
        .fail_create_order
        .store(false, std::sync::atomic::Ordering::SeqCst);
    let (status, order) = ctx.post("/checkout/order", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["payment_intent_id"], "pi_test_123");
    assert_eq!(ctx.store.order_count(), 1);
}

#[tokio::test]
async fn decline_surfaces_gateway_message_and_allows_retry() {
    let mut ctx = TestContext::new();
    reach_payment(&mut ctx).await;

    ctx.gateway
        .decline_next
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let (status, body) = ctx
        .post("/checkout/payment", json!({ "card_token": "tok_declined" }))
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "payment_declined");
    assert_eq!(body["message"], "Your card was declined.");

    // Still at Payment; the authorization survives for a retry
    let (_, checkout) = ctx.get("/checkout").await;
    assert_eq!(checkout["step"], "payment");
    assert_eq!(checkout["paid"], false);
    assert!(checkout["payment"]["client_secret"].is_string());

    let (status, body) = ctx
        .post("/checkout/payment", json!({ "card_token": "tok_visa" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "review");
}

#[tokio::test]
async fn emptied_cart_forces_session_back_to_browsing() {
    let mut ctx = TestContext::new();
    let kit = ctx.product_id("Lion's Mane Grow Kit");

    ctx.post("/cart/add", json!({ "product_id": kit })).await;
    let (status, _) = ctx.get("/checkout").await;
    assert_eq!(status, StatusCode::OK);

    // Cart cleared out from under the open checkout
    ctx.post("/cart/clear", json!({})).await;

    let (status, body) = ctx
        .post("/checkout/shipping", valid_address_json("Mora Spore"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "cart_empty");
    assert_eq!(body["redirect"], "/products");

    // The checkout blob was dropped, not left on a dead step
    let (status, body) = ctx.get("/checkout").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "cart_empty");
}

#[tokio::test]
async fn checkout_resumes_mid_flow_from_the_session() {
    let mut ctx = TestContext::new();
    let kit = ctx.product_id("Lion's Mane Grow Kit");

    ctx.post("/cart/add", json!({ "product_id": kit })).await;
    ctx.get("/checkout").await;
    ctx.post("/checkout/shipping", valid_address_json("Mora Spore"))
        .await;

    // A later GET (a reload) reproduces the persisted step and addresses
    let (status, body) = ctx.get("/checkout").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "billing");
    assert_eq!(body["shipping_address"]["full_name"], "Mora Spore");
    assert_eq!(body["billing_address"]["full_name"], "Mora Spore");
    assert_eq!(body["use_same_as_shipping"], true);
}

#[tokio::test]
async fn validation_failure_keeps_the_machine_in_place() {
    let mut ctx = TestContext::new();
    let kit = ctx.product_id("Lion's Mane Grow Kit");

    ctx.post("/cart/add", json!({ "product_id": kit })).await;
    ctx.get("/checkout").await;

    let mut bad = valid_address_json("Mora Spore");
    bad["email"] = json!("not-an-email");
    bad["postal_code"] = json!("123");

    let (status, body) = ctx.post("/checkout/shipping", bad).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_failed");
    assert!(body["fields"]["email"].is_string());
    assert!(body["fields"]["postal_code"].is_string());

    let (_, checkout) = ctx.get("/checkout").await;
    assert_eq!(checkout["step"], "shipping");
}

#[tokio::test]
async fn separate_billing_address_is_used_when_flag_off() {
    let mut ctx = TestContext::new();
    reach_payment(&mut ctx).await;

    // Walk back to billing and resubmit with a distinct billing address
    ctx.post("/checkout/back", json!({})).await;
    let (status, body) = ctx
        .post(
            "/checkout/billing",
            json!({
                "use_same_as_shipping": false,
                "address": valid_address_json("Billing Person"),
                "order_notes": "leave at the door"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "payment");
    assert_eq!(body["billing_address"]["full_name"], "Billing Person");
    assert_eq!(body["shipping_address"]["full_name"], "Mora Spore");
    assert_eq!(body["order_notes"], "leave at the door");
}

#[tokio::test]
async fn back_from_shipping_exits_toward_the_shop() {
    let mut ctx = TestContext::new();
    let kit = ctx.product_id("Lion's Mane Grow Kit");

    ctx.post("/cart/add", json!({ "product_id": kit })).await;
    ctx.get("/checkout").await;

    let (status, body) = ctx.post("/checkout/back", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "cart");
}

#[tokio::test]
async fn cart_change_on_payment_step_reauthorizes_for_new_total() {
    let mut ctx = TestContext::new();
    reach_payment(&mut ctx).await;

    let first_amount = ctx
        .gateway
        .last_amount
        .lock()
        .unwrap()
        .expect("an authorization was requested");
    assert_eq!(first_amount, 3698);

    // Add a second kit while sitting on the Payment step:
    // subtotal 44.98, free-shipping not reached, tax rounds to 4.00
    let oyster = ctx.product_id("Blue Oyster Grow Kit");
    ctx.post("/cart/add", json!({ "product_id": oyster })).await;

    let (status, body) = ctx
        .post("/checkout/payment", json!({ "card_token": "tok_visa" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "review");

    let reauthorized = ctx.gateway.last_amount.lock().unwrap().unwrap();
    assert_eq!(reauthorized, 2499 + 1999 + 999 + 400);

    // The order records the re-authorized intent, not the stale one
    let (_, order) = ctx.post("/checkout/order", json!({})).await;
    assert_eq!(order["payment_intent_id"], "pi_test_124");
    assert_eq!(order["total_amount"], 2499 + 1999 + 999 + 400);
}

#[tokio::test]
async fn gateway_outage_blocks_submission_until_retried() {
    let mut ctx = TestContext::new();
    let kit = ctx.product_id("Lion's Mane Grow Kit");

    ctx.post("/cart/add", json!({ "product_id": kit })).await;
    ctx.get("/checkout").await;
    ctx.post("/checkout/shipping", valid_address_json("Mora Spore"))
        .await;

    ctx.gateway
        .fail_create
        .store(true, std::sync::atomic::Ordering::SeqCst);

    // Billing still advances, but authorization fails and is surfaced
    let (status, body) = ctx
        .post("/checkout/billing", json!({ "use_same_as_shipping": true }))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "payment_unavailable");

    // Confirming without an authorization is refused locally
    let (status, body) = ctx
        .post("/checkout/payment", json!({ "card_token": "tok_visa" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "payment_not_initialized");

    // Retry the authorization once the gateway is back
    ctx.gateway
        .fail_create
        .store(false, std::sync::atomic::Ordering::SeqCst);
    let (status, body) = ctx.post("/checkout/payment/intent", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["payment"]["client_secret"].is_string());

    let (status, body) = ctx
        .post("/checkout/payment", json!({ "card_token": "tok_visa" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "review");
}

#[tokio::test]
async fn cancel_keeps_the_cart_and_restarts_checkout_fresh() {
    let mut ctx = TestContext::new();
    let kit = ctx.product_id("Lion's Mane Grow Kit");

    ctx.post("/cart/add", json!({ "product_id": kit })).await;
    ctx.get("/checkout").await;
    ctx.post("/checkout/shipping", valid_address_json("Mora Spore"))
        .await;

    let (status, body) = ctx.post("/checkout/cancel", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled"], true);

    let (_, cart) = ctx.get("/cart").await;
    assert_eq!(cart["item_count"], 1);

    // A new checkout starts over at Shipping with no remembered address
    let (status, body) = ctx.get("/checkout").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "shipping");
    assert!(body["shipping_address"].is_null());
}

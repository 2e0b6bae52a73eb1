//! Payment route handlers.
//!
//! Two surfaces live here:
//!
//! - `POST /api/payment-intent`: the public authorization endpoint. It
//!   validates the raw JSON body itself (bad JSON is a 400, not a framework
//!   rejection), enforces the gateway minimum, and proxies to the gateway.
//! - `POST /checkout/payment` and `/checkout/payment/intent`: the checkout
//!   side - confirm the pending authorization with a card token, or
//!   re-request an authorization after a failed initialization.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use fungal_flux_core::Money;

use crate::checkout::flow::{CheckoutStep, PaymentReceipt};
use crate::error::{AppError, Result};
use crate::models::address::FieldErrors;
use crate::models::session::{load_checkout, save_checkout};
use crate::payments::{CreateIntentRequest, MIN_CHARGE_CENTS, PaymentError};
use crate::routes::checkout::{CheckoutView, build_view, ensure_authorization, load_guarded};
use crate::state::AppState;

/// Masked placeholder when the gateway does not report card digits.
const MASKED_LAST4: &str = "****";

// =============================================================================
// Public authorization endpoint
// =============================================================================

/// `POST /api/payment-intent`
///
/// Request: `{ amount: minor units >= 50, currency?, metadata? }`.
/// Success: `{ clientSecret, paymentIntentId }`. Errors: 400 for malformed
/// JSON or an invalid amount, 500 when the processor fails. Non-POST
/// methods are rejected with 405 by the router.
#[instrument(skip(state, body))]
pub async fn create_payment_intent(State(state): State<AppState>, body: Bytes) -> Response {
    // Parse the raw body; an empty body is treated as an empty object so it
    // fails the amount check rather than the JSON check.
    let payload: serde_json::Value = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Invalid JSON payload" })),
                )
                    .into_response();
            }
        }
    };

    // The amount must be a finite number of minor units at or above the
    // gateway minimum.
    let Some(amount) = payload.get("amount").and_then(valid_amount) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid amount" })),
        )
            .into_response();
    };

    let currency = payload
        .get("currency")
        .and_then(|v| v.as_str())
        .unwrap_or(state.config().currency.as_str())
        .to_string();

    let mut metadata: std::collections::BTreeMap<String, String> = payload
        .get("metadata")
        .and_then(|v| v.as_object())
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();
    metadata
        .entry("order_type".to_string())
        .or_insert_with(|| "fungal-flux-order".to_string());

    let request = CreateIntentRequest {
        amount,
        currency,
        metadata,
    };

    match state.payments().create_intent(&request).await {
        Ok(intent) => (
            StatusCode::OK,
            Json(json!({
                "clientSecret": intent.client_secret,
                "paymentIntentId": intent.intent_id,
            })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "payment intent creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to create payment intent",
                    "message": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// Accept integral JSON numbers (or floats with no fractional part) at or
/// above the gateway minimum.
fn valid_amount(value: &serde_json::Value) -> Option<Money> {
    let number = value.as_f64()?;
    if !number.is_finite() || number < MIN_CHARGE_CENTS as f64 || number > 1e15 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)] // bounded just above
    Some(Money::from_cents(number.round() as i64))
}

// =============================================================================
// Checkout payment handlers
// =============================================================================

/// Confirm-payment request body.
#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    /// Opaque card token produced by the gateway on the shopper's device.
    pub card_token: String,
}

/// Re-request an authorization for the current total.
///
/// Used after a failed initialization, or whenever the cart changed while
/// sitting on the Payment step.
#[instrument(skip(state, session))]
pub async fn refresh_intent(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CheckoutView>> {
    let (cart, mut flow) = load_guarded(&session).await?;
    flow.require_step(CheckoutStep::Payment)?;

    ensure_authorization(&state, &mut flow, &cart).await?;
    save_checkout(&session, &flow).await?;

    Ok(Json(build_view(&state, &flow, &cart)?))
}

/// Confirm the pending authorization with a collected card token.
///
/// Preconditions are checked locally before any network call: the checkout
/// must be at Payment, an authorization must exist, and the card token must
/// be non-empty. Only one confirmation may be in flight per checkout; a
/// re-submission while one is pending is refused. A confirmation that
/// resolves after the checkout moved elsewhere is discarded.
#[instrument(skip(state, session, form))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<ConfirmForm>,
) -> Result<Json<CheckoutView>> {
    let (cart, mut flow) = load_guarded(&session).await?;
    flow.require_step(CheckoutStep::Payment)?;

    let card_token = form.card_token.trim().to_string();
    if card_token.is_empty() {
        let mut fields = FieldErrors::new();
        fields.insert("card_token", "Card details are required".to_string());
        return Err(AppError::Validation(fields));
    }
    if flow.authorization.is_none() {
        return Err(AppError::PaymentNotInitialized);
    }

    let _permit = state
        .submissions()
        .acquire(flow.flow_id)
        .ok_or(AppError::SubmissionInFlight)?;

    // The authorization must cover the current total; a cart change while
    // sitting on the Payment step re-requests before confirming.
    ensure_authorization(&state, &mut flow, &cart).await?;
    save_checkout(&session, &flow).await?;
    let authorization = flow
        .authorization
        .clone()
        .ok_or(AppError::PaymentNotInitialized)?;

    let outcome = state
        .payments()
        .confirm_intent(&authorization.intent_id, &card_token)
        .await;

    // Discard results that no longer apply: the shopper may have navigated
    // backward while the confirmation was in flight.
    let mut current = load_checkout(&session)
        .await?
        .ok_or(AppError::StaleCompletion)?;
    let still_current = current.step == CheckoutStep::Payment
        && current
            .authorization
            .as_ref()
            .is_some_and(|a| a.intent_id == authorization.intent_id);
    if !still_current {
        tracing::warn!(
            intent_id = %authorization.intent_id,
            "discarding payment result for an outdated checkout step"
        );
        return Err(AppError::StaleCompletion);
    }

    match outcome {
        Ok(confirmation) => {
            let receipt = PaymentReceipt {
                reference_id: confirmation.reference_id,
                last4: confirmation
                    .last4
                    .unwrap_or_else(|| MASKED_LAST4.to_string()),
            };
            current.record_payment(receipt)?;
            save_checkout(&session, &current).await?;
            Ok(Json(build_view(&state, &current, &cart)?))
        }
        Err(PaymentError::Declined { message }) => {
            // The authorization generally survives a decline; leave it in
            // place so the shopper can correct the card and retry.
            tracing::info!(message = %message, "payment declined");
            Err(AppError::PaymentDeclined(message))
        }
        Err(err) => Err(AppError::PaymentInit(err)),
    }
}

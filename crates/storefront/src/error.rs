//! Unified error handling with Sentry integration.
//!
//! Every remote interaction has a defined failure branch; nothing here is
//! allowed to crash a session. `AppError` is the single type handlers
//! return; `IntoResponse` converts it to a JSON error body and captures
//! server-side failures to Sentry first.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::checkout::flow::FlowError;
use crate::checkout::submit::SubmitError;
use crate::models::address::FieldErrors;
use crate::payments::PaymentError;
use crate::store::StoreError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// One or more input fields failed validation. Recovered locally: the
    /// checkout stays on its step and the messages are shown inline.
    #[error("validation failed")]
    Validation(FieldErrors),

    /// A checkout transition was attempted out of order.
    #[error("checkout flow error: {0}")]
    Flow(#[from] FlowError),

    /// A checkout operation arrived before checkout was begun.
    #[error("checkout has not been started")]
    CheckoutNotStarted,

    /// The cart emptied while checkout was open; the session is forced back
    /// to shop browsing.
    #[error("cart is empty")]
    StaleCart,

    /// A payment confirmation or order placement is already in flight for
    /// this checkout.
    #[error("a submission is already in progress")]
    SubmissionInFlight,

    /// A remote call resolved after the checkout moved on; its result was
    /// discarded instead of being applied out of order.
    #[error("operation completed for an outdated checkout step")]
    StaleCompletion,

    /// Payment was submitted before an authorization existed.
    #[error("payment has not been initialized")]
    PaymentNotInitialized,

    /// The gateway could not be reached or rejected initialization.
    /// Submission stays blocked until the shopper retries.
    #[error("payment initialization failed: {0}")]
    PaymentInit(PaymentError),

    /// The gateway reports the charge failed. The message is the gateway's,
    /// verbatim; input stays intact for correction and retry.
    #[error("payment declined: {0}")]
    PaymentDeclined(String),

    /// A commerce store read failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The atomic order-creation call failed after payment succeeded.
    /// Retryable: the payment reference is the idempotency key, so a retry
    /// can never double-record the charge.
    #[error("order persistence failed: {0}")]
    OrderPersistence(SubmitError),

    /// Session store failure.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::PaymentInit(_)
                | Self::Store(_)
                | Self::OrderPersistence(_)
                | Self::Session(_)
                | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side failures to Sentry before responding
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, body) = match &self {
            Self::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "validation_failed", "fields": fields }),
            ),
            Self::Flow(err) => (
                StatusCode::CONFLICT,
                json!({ "error": "invalid_step", "message": err.to_string() }),
            ),
            Self::CheckoutNotStarted => (
                StatusCode::CONFLICT,
                json!({ "error": "checkout_not_started" }),
            ),
            Self::StaleCart => (
                StatusCode::CONFLICT,
                json!({ "error": "cart_empty", "redirect": "/products" }),
            ),
            Self::SubmissionInFlight => (
                StatusCode::CONFLICT,
                json!({ "error": "submission_in_flight" }),
            ),
            Self::StaleCompletion => (
                StatusCode::CONFLICT,
                json!({ "error": "stale_payment_result" }),
            ),
            Self::PaymentNotInitialized => (
                StatusCode::CONFLICT,
                json!({ "error": "payment_not_initialized" }),
            ),
            Self::PaymentInit(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "payment_unavailable", "retryable": true }),
            ),
            Self::PaymentDeclined(message) => (
                StatusCode::PAYMENT_REQUIRED,
                json!({ "error": "payment_declined", "message": message }),
            ),
            Self::Store(StoreError::NotFound(message)) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not_found", "message": message }),
            ),
            Self::Store(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "store_unavailable" }),
            ),
            Self::OrderPersistence(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "order_persistence_failed", "retryable": true }),
            ),
            Self::Session(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "internal" }),
            ),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not_found", "message": message }),
            ),
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "bad_request", "message": message }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_validation_is_unprocessable() {
        let mut fields = FieldErrors::new();
        fields.insert("email", "Email is required".into());
        assert_eq!(
            status_of(AppError::Validation(fields)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_declines_are_payment_required() {
        assert_eq!(
            status_of(AppError::PaymentDeclined("Your card was declined.".into())),
            StatusCode::PAYMENT_REQUIRED
        );
    }

    #[test]
    fn test_stale_and_conflict_states() {
        assert_eq!(status_of(AppError::StaleCart), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::SubmissionInFlight), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::StaleCompletion), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::CheckoutNotStarted), StatusCode::CONFLICT);
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        assert_eq!(
            status_of(AppError::Store(StoreError::NotFound("order".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::Api {
                status: 500,
                message: "boom".into()
            })),
            StatusCode::BAD_GATEWAY
        );
    }
}

//! Hosted payment gateway client.
//!
//! The gateway tokenizes card data on the shopper's device; the storefront
//! only ever sees an opaque card token. The protocol is two calls: request
//! an authorization for an exact amount, then confirm it with the token.
//! An authorization survives failed confirmation attempts until the gateway
//! reports it consumed.
//!
//! [`PaymentGateway`] is the seam used by the checkout handlers; tests swap
//! in a scripted fake.

mod client;

pub use client::GatewayClient;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use fungal_flux_core::Money;

/// Gateway-imposed minimum charge, in minor units.
pub const MIN_CHARGE_CENTS: i64 = 50;

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the request or misbehaved.
    #[error("payment gateway error: {message}")]
    Gateway {
        /// HTTP status code.
        status: u16,
        /// Gateway-provided message.
        message: String,
    },

    /// The charge itself failed (declined card, expired authorization).
    /// The message is the gateway's human-readable reason, shown verbatim.
    #[error("{message}")]
    Declined {
        /// Gateway-provided reason.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The amount is below the gateway minimum; caught before any network
    /// call.
    #[error("amount must be at least {MIN_CHARGE_CENTS} minor units")]
    AmountTooSmall,
}

/// Request for a new payment authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntentRequest {
    /// Charge amount in minor units; must be at least [`MIN_CHARGE_CENTS`].
    pub amount: Money,
    /// Lowercase ISO currency code, e.g. `usd`.
    pub currency: String,
    /// Free-form string metadata attached to the charge.
    pub metadata: BTreeMap<String, String>,
}

/// An authorization handle for one pending charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// A settled confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// The gateway's reference id for the captured charge.
    pub reference_id: String,
    /// Last four card digits, when the gateway reports them.
    pub last4: Option<String>,
}

/// The payment gateway, as the checkout sees it.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Request an authorization for an exact amount.
    async fn create_intent(
        &self,
        request: &CreateIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Confirm an authorization with a tokenized card.
    ///
    /// May suspend for as long as the gateway takes; the caller holds the
    /// per-checkout submission lock for the duration.
    async fn confirm_intent(
        &self,
        intent_id: &str,
        card_token: &str,
    ) -> Result<PaymentConfirmation, PaymentError>;
}

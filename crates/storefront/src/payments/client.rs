//! HTTP client for the hosted payment gateway.
//!
//! The gateway exposes a form-encoded REST API authenticated with a secret
//! key. Card declines come back as structured errors with a human-readable
//! message, which is passed through verbatim for display.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use async_trait::async_trait;

use crate::config::PaymentGatewayConfig;
use crate::payments::{
    CreateIntentRequest, MIN_CHARGE_CENTS, PaymentConfirmation, PaymentError, PaymentGateway,
    PaymentIntent,
};

/// Client for the payment gateway.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<GatewayClientInner>,
}

struct GatewayClientInner {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

/// Wire shape of an intent returned by the gateway.
#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    status: String,
    #[serde(default)]
    payment_method_details: Option<PaymentMethodDetails>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethodDetails {
    #[serde(default)]
    card: Option<CardDetails>,
}

#[derive(Debug, Deserialize)]
struct CardDetails {
    #[serde(default)]
    last4: Option<String>,
}

/// Wire shape of a gateway error body.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl GatewayClient {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(config: &PaymentGatewayConfig) -> Self {
        // Confirmation can take as long as the gateway needs, but "no
        // response at all" becomes an error instead of an indefinite hang.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");

        Self {
            inner: Arc::new(GatewayClientInner {
                client,
                base_url: config.api_url.trim_end_matches('/').to_string(),
                secret_key: config.secret_key.expose_secret().to_string(),
            }),
        }
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<IntentResponse, PaymentError> {
        let response = self
            .inner
            .client
            .post(format!("{}{path}", self.inner.base_url))
            .bearer_auth(&self.inner.secret_key)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Self::map_error(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "failed to parse gateway response"
            );
            PaymentError::Parse(e)
        })
    }

    /// Distinguish a card decline from every other gateway failure, so the
    /// decline reason can be shown verbatim with a retry affordance.
    fn map_error(status: u16, body: &str) -> PaymentError {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) => {
                let message = parsed
                    .error
                    .message
                    .unwrap_or_else(|| "payment failed".to_string());
                if parsed.error.kind.as_deref() == Some("card_error") {
                    PaymentError::Declined { message }
                } else {
                    PaymentError::Gateway { status, message }
                }
            }
            Err(_) => PaymentError::Gateway {
                status,
                message: body.chars().take(200).collect(),
            },
        }
    }
}

#[async_trait]
impl PaymentGateway for GatewayClient {
    #[instrument(skip(self, request), fields(amount = request.amount.cents()))]
    async fn create_intent(
        &self,
        request: &CreateIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        if request.amount.cents() < MIN_CHARGE_CENTS {
            return Err(PaymentError::AmountTooSmall);
        }

        let mut form = vec![
            ("amount".to_string(), request.amount.cents().to_string()),
            ("currency".to_string(), request.currency.clone()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let intent = self.post_form("/v1/payment_intents", &form).await?;
        let client_secret = intent.client_secret.ok_or_else(|| PaymentError::Gateway {
            status: 200,
            message: "intent response missing client secret".to_string(),
        })?;

        Ok(PaymentIntent {
            intent_id: intent.id,
            client_secret,
        })
    }

    #[instrument(skip(self, card_token), fields(intent_id = %intent_id))]
    async fn confirm_intent(
        &self,
        intent_id: &str,
        card_token: &str,
    ) -> Result<PaymentConfirmation, PaymentError> {
        let form = vec![("payment_method".to_string(), card_token.to_string())];
        let intent = self
            .post_form(&format!("/v1/payment_intents/{intent_id}/confirm"), &form)
            .await?;

        if intent.status != "succeeded" {
            return Err(PaymentError::Declined {
                message: format!("payment did not complete (status: {})", intent.status),
            });
        }

        let last4 = intent
            .payment_method_details
            .and_then(|d| d.card)
            .and_then(|c| c.last4);

        Ok(PaymentConfirmation {
            reference_id: intent.id,
            last4,
        })
    }
}

//! Checkout flow route handlers.
//!
//! Each handler loads the cart and checkout state from the durable session,
//! applies one state-machine transition, and writes the state back. The
//! empty-cart guard runs first on every one of them: if the cart emptied
//! while checkout was open, the checkout blob is dropped and the shopper is
//! sent back to shop browsing instead of being left on a dead step.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use fungal_flux_core::Money;

use crate::checkout::cart::Cart;
use crate::checkout::flow::{CheckoutState, CheckoutStep, PaymentAuthorization};
use crate::checkout::pricing::OrderTotals;
use crate::error::{AppError, Result};
use crate::models::address::{Address, AddressForm, FieldErrors};
use crate::models::session::{clear_checkout, load_cart, load_checkout, save_checkout};
use crate::payments::CreateIntentRequest;
use crate::state::AppState;

/// Metadata tag attached to every charge.
const ORDER_TYPE_TAG: &str = "fungal-flux-order";

/// The checkout as sent to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub use_same_as_shipping: bool,
    pub order_notes: Option<String>,
    pub item_count: u64,
    pub totals: OrderTotals,
    pub payment: Option<PaymentView>,
    pub paid: bool,
}

/// What the shopper's device needs to collect card details.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentView {
    pub client_secret: String,
    pub publishable_key: String,
    pub amount: Money,
}

/// Build the client view of a checkout.
pub(crate) fn build_view(
    state: &AppState,
    flow: &CheckoutState,
    cart: &Cart,
) -> Result<CheckoutView> {
    let subtotal = cart
        .total_price()
        .map_err(|_| AppError::BadRequest("cart amounts out of range".to_string()))?;
    let totals = OrderTotals::compute(subtotal)
        .map_err(|_| AppError::Internal("order totals out of range".to_string()))?;

    let payment = flow.authorization.as_ref().map(|auth| PaymentView {
        client_secret: auth.client_secret.clone(),
        publishable_key: state.config().payments.publishable_key.clone(),
        amount: auth.amount,
    });

    Ok(CheckoutView {
        step: flow.step,
        shipping_address: flow.form.shipping_address.clone(),
        billing_address: flow.form.billing_address.clone(),
        use_same_as_shipping: flow.form.use_same_as_shipping,
        order_notes: flow.form.order_notes.clone(),
        item_count: cart.total_items(),
        totals,
        payment,
        paid: flow.receipt.is_some(),
    })
}

/// Load cart and checkout, enforcing the empty-cart guard.
///
/// On an emptied cart the checkout blob is cleared before the error is
/// returned, forcing the session back to a safe state.
pub(crate) async fn load_guarded(session: &Session) -> Result<(Cart, CheckoutState)> {
    let cart = load_cart(session).await?;
    let flow = load_checkout(session)
        .await?
        .ok_or(AppError::CheckoutNotStarted)?;

    if flow.guard_cart(&cart).is_err() {
        tracing::info!("cart emptied mid-checkout; forcing session back to browsing");
        clear_checkout(session).await?;
        return Err(AppError::StaleCart);
    }

    Ok((cart, flow))
}

/// Request (or re-request) a gateway authorization for the current total.
///
/// Called on entry to the Payment step and again whenever the computed
/// total no longer matches the recorded authorization amount.
pub(crate) async fn ensure_authorization(
    state: &AppState,
    flow: &mut CheckoutState,
    cart: &Cart,
) -> Result<()> {
    let subtotal = cart
        .total_price()
        .map_err(|_| AppError::BadRequest("cart amounts out of range".to_string()))?;
    let totals = OrderTotals::compute(subtotal)
        .map_err(|_| AppError::Internal("order totals out of range".to_string()))?;

    if flow
        .authorization
        .as_ref()
        .is_some_and(|auth| auth.amount == totals.total)
    {
        return Ok(());
    }

    let request = CreateIntentRequest {
        amount: totals.total,
        currency: state.config().currency.clone(),
        metadata: [
            ("order_type".to_string(), ORDER_TYPE_TAG.to_string()),
            ("total_display".to_string(), totals.total.to_string()),
        ]
        .into(),
    };

    let intent = state
        .payments()
        .create_intent(&request)
        .await
        .map_err(AppError::PaymentInit)?;

    flow.record_authorization(PaymentAuthorization {
        intent_id: intent.intent_id,
        client_secret: intent.client_secret,
        amount: totals.total,
    })?;

    Ok(())
}

/// Billing step request body.
#[derive(Debug, Default, Deserialize)]
pub struct BillingForm {
    #[serde(default)]
    pub use_same_as_shipping: Option<bool>,
    #[serde(default)]
    pub address: Option<AddressForm>,
    #[serde(default)]
    pub order_notes: Option<String>,
}

/// Cancel response body.
#[derive(Debug, Serialize)]
pub struct CancelledView {
    pub cancelled: bool,
    pub redirect: &'static str,
}

/// Enter or resume checkout.
///
/// A fresh session starts at Shipping; an interrupted one resumes at
/// whatever step and addresses were last persisted. Requires a non-empty
/// cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CheckoutView>> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        clear_checkout(&session).await?;
        return Err(AppError::StaleCart);
    }

    let flow = match load_checkout(&session).await? {
        Some(existing) => existing,
        None => {
            let fresh = CheckoutState::begin();
            save_checkout(&session, &fresh).await?;
            fresh
        }
    };

    Ok(Json(build_view(&state, &flow, &cart)?))
}

/// Submit the shipping address and advance to Billing.
#[instrument(skip(state, session, form))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddressForm>,
) -> Result<Json<CheckoutView>> {
    let (cart, mut flow) = load_guarded(&session).await?;

    let address = form.validate().map_err(AppError::Validation)?;
    flow.submit_shipping(address)?;
    save_checkout(&session, &flow).await?;

    Ok(Json(build_view(&state, &flow, &cart)?))
}

/// Submit the billing address (or alias shipping) and advance to Payment.
///
/// Entering Payment immediately requests a gateway authorization for the
/// computed total. If the gateway is unreachable the step still advances -
/// the state is saved with no authorization and submission stays blocked
/// until a retry succeeds.
#[instrument(skip(state, session, form))]
pub async fn billing(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<BillingForm>,
) -> Result<Json<CheckoutView>> {
    let (cart, mut flow) = load_guarded(&session).await?;

    if let Some(flag) = form.use_same_as_shipping {
        flow.set_use_same_as_shipping(flag);
    }

    let address = if flow.form.use_same_as_shipping {
        None
    } else {
        let raw = form.address.ok_or_else(|| {
            let mut fields = FieldErrors::new();
            fields.insert("address", "Billing address is required".to_string());
            AppError::Validation(fields)
        })?;
        Some(raw.validate().map_err(AppError::Validation)?)
    };

    flow.submit_billing(address, form.order_notes)?;

    let authorization = ensure_authorization(&state, &mut flow, &cart).await;
    // Persist the advanced step even when the gateway was unreachable; the
    // shopper retries authorization from the Payment step.
    save_checkout(&session, &flow).await?;
    authorization?;

    Ok(Json(build_view(&state, &flow, &cart)?))
}

/// Step back by one; from Shipping this lands on Cart, i.e. out of the
/// checkout and back to browsing.
#[instrument(skip(state, session))]
pub async fn back(State(state): State<AppState>, session: Session) -> Result<Json<CheckoutView>> {
    let (cart, mut flow) = load_guarded(&session).await?;

    flow.back();
    save_checkout(&session, &flow).await?;

    Ok(Json(build_view(&state, &flow, &cart)?))
}

/// Abandon the checkout, keeping the cart.
#[instrument(skip(session))]
pub async fn cancel(session: Session) -> Result<Json<CancelledView>> {
    clear_checkout(&session).await?;
    Ok(Json(CancelledView {
        cancelled: true,
        redirect: "/products",
    }))
}

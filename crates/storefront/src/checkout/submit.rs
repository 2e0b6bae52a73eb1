//! Order submission.
//!
//! The single entry point that turns a paid checkout into a persisted
//! order. Totals are recomputed from the live cart here - a client-held
//! total is never trusted - and the store call is atomic: one id comes back
//! or nothing was written. On failure the caller leaves the cart and
//! checkout state untouched so the shopper can retry without re-entering
//! addresses or paying again; the payment reference doubles as the
//! idempotency key on the store side.

use chrono::Local;
use tracing::instrument;

use fungal_flux_core::OrderNumber;

use crate::checkout::cart::Cart;
use crate::checkout::flow::{CheckoutState, CheckoutStep, FlowError};
use crate::checkout::pricing::OrderTotals;
use crate::store::types::{CreateOrderInput, Order, OrderItemInput};
use crate::store::{CommerceStore, StoreError};

/// Errors from order submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The checkout is not in a submittable state.
    #[error("checkout is not ready for submission: {0}")]
    Flow(#[from] FlowError),

    /// Cart or totals arithmetic overflowed.
    #[error("order amounts out of range")]
    AmountsOutOfRange,

    /// The atomic order-creation call failed; nothing was persisted and the
    /// submission can be retried.
    #[error("order could not be persisted: {0}")]
    Store(#[from] StoreError),
}

/// Persist the order for a checkout that has reached Review.
///
/// On success the returned [`Order`] is the store's own record, re-read
/// after creation. The caller is responsible for clearing the cart and the
/// durable checkout state - and must only do so when this returns `Ok`.
///
/// # Errors
///
/// Returns [`SubmitError::Flow`] when preconditions do not hold (wrong
/// step, no payment receipt, empty cart), [`SubmitError::AmountsOutOfRange`]
/// on arithmetic overflow, and [`SubmitError::Store`] when the remote call
/// fails.
#[instrument(skip_all, fields(flow_id = %state.flow_id))]
pub async fn submit_order(
    store: &dyn CommerceStore,
    state: &CheckoutState,
    cart: &Cart,
) -> Result<Order, SubmitError> {
    state.require_step(CheckoutStep::Review)?;
    state.guard_cart(cart)?;

    let shipping_address = state
        .form
        .shipping_address
        .clone()
        .ok_or(FlowError::MissingShippingAddress)?;
    let billing_address = state
        .form
        .billing_address
        .clone()
        .ok_or(FlowError::MissingBillingAddress)?;
    let receipt = state.receipt.clone().ok_or(FlowError::NotPaid)?;

    // Recompute from the live cart; a stale client-held total could have
    // been tampered with between steps.
    let subtotal = cart
        .total_price()
        .map_err(|_| SubmitError::AmountsOutOfRange)?;
    let totals =
        OrderTotals::compute(subtotal).map_err(|_| SubmitError::AmountsOutOfRange)?;

    let items = cart
        .lines()
        .iter()
        .map(|line| {
            Ok(OrderItemInput {
                product_id: line.product_id,
                product_name: line.name.clone(),
                product_image: line.image_url.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                total_price: line
                    .line_total()
                    .map_err(|_| SubmitError::AmountsOutOfRange)?,
            })
        })
        .collect::<Result<Vec<_>, SubmitError>>()?;

    let input = CreateOrderInput {
        order_number: OrderNumber::generate(Local::now().date_naive()),
        shipping_address,
        billing_address,
        subtotal: totals.subtotal,
        shipping_cost: totals.shipping,
        tax_amount: totals.tax,
        total_amount: totals.total,
        payment_intent_id: receipt.reference_id,
        payment_method_last4: receipt.last4,
        order_notes: state.form.order_notes.clone(),
        items,
    };

    let order_id = store.create_order(&input).await?;
    tracing::info!(order_id = %order_id, order_number = %input.order_number, "order persisted");

    let order = store.get_order(order_id).await?;
    Ok(order)
}

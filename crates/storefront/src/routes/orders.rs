//! Order route handlers: place the order from Review, and read a persisted
//! order back for the confirmation page.

use axum::{
    Json,
    extract::{Path, State},
};
use tower_sessions::Session;
use tracing::instrument;

use fungal_flux_core::OrderId;

use crate::checkout::submit::{SubmitError, submit_order};
use crate::error::{AppError, Result};
use crate::models::session::{clear_cart, clear_checkout};
use crate::routes::checkout::load_guarded;
use crate::state::AppState;
use crate::store::types::Order;

/// Place the order for a checkout at the Review step.
///
/// Shares the submission lock with payment confirmation: at most one
/// attempt per checkout is in flight. On success the cart and the durable
/// checkout state are cleared and the persisted order is returned; on
/// failure both are left exactly as they were, so the shopper retries
/// without re-entering anything - the already-captured payment reference
/// makes the retry idempotent on the store side.
#[instrument(skip(state, session))]
pub async fn place(State(state): State<AppState>, session: Session) -> Result<Json<Order>> {
    let (cart, flow) = load_guarded(&session).await?;

    let _permit = state
        .submissions()
        .acquire(flow.flow_id)
        .ok_or(AppError::SubmissionInFlight)?;

    let order = submit_order(state.store(), &flow, &cart)
        .await
        .map_err(|err| match err {
            SubmitError::Flow(flow_err) => AppError::Flow(flow_err),
            SubmitError::AmountsOutOfRange => {
                AppError::Internal("order amounts out of range".to_string())
            }
            store_err @ SubmitError::Store(_) => AppError::OrderPersistence(store_err),
        })?;

    clear_cart(&session).await?;
    clear_checkout(&session).await?;

    Ok(Json(order))
}

/// Fetch one persisted order with its items.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>> {
    let id: OrderId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid order id: {id}")))?;
    let order = state.store().get_order(id).await?;
    Ok(Json(order))
}

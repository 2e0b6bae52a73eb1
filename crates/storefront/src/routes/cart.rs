//! Cart route handlers.
//!
//! The cart lives in the shopper's durable session; every mutation loads
//! it, applies the change, and writes it back. Amounts in responses are
//! minor units; the totals block is the same calculation the checkout
//! charges, so the estimate never disagrees with the charge.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use fungal_flux_core::{Money, ProductId};

use crate::checkout::cart::{Cart, CartError};
use crate::checkout::pricing::{FREE_SHIPPING_THRESHOLD, OrderTotals};
use crate::error::{AppError, Result};
use crate::models::address::FieldErrors;
use crate::models::session::{load_cart, save_cart};
use crate::state::AppState;

/// One cart line as sent to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

/// The cart as sent to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub totals: OrderTotals,
    /// How much more to add for free shipping, when below the threshold.
    pub free_shipping_gap: Option<Money>,
}

impl CartView {
    /// Build the client view, deriving totals from the live cart.
    pub(crate) fn build(cart: &Cart) -> Result<Self> {
        let items = cart
            .lines()
            .iter()
            .map(|line| {
                Ok(CartItemView {
                    product_id: line.product_id,
                    name: line.name.clone(),
                    image_url: line.image_url.clone(),
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                    line_total: line.line_total().map_err(cart_error)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let subtotal = cart.total_price().map_err(cart_error)?;
        let totals = OrderTotals::compute(subtotal)
            .map_err(|_| AppError::Internal("order totals out of range".to_string()))?;
        let free_shipping_gap = FREE_SHIPPING_THRESHOLD
            .cents()
            .checked_sub(subtotal.cents())
            .filter(|gap| *gap > 0)
            .map(Money::from_cents);

        Ok(Self {
            items,
            item_count: cart.total_items(),
            totals,
            free_shipping_gap,
        })
    }
}

fn cart_error(err: CartError) -> AppError {
    match err {
        CartError::ZeroQuantity => {
            let mut fields = FieldErrors::new();
            fields.insert("quantity", "Quantity must be at least 1".to_string());
            AppError::Validation(fields)
        }
        CartError::Overflow => AppError::BadRequest("cart amounts out of range".to_string()),
    }
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub product_id: ProductId,
}

/// Cart count response.
#[derive(Debug, Serialize)]
pub struct CountView {
    pub count: u64,
}

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::build(&cart)?))
}

/// Add an item to the cart.
///
/// The product is fetched from the store so the cart snapshots its current
/// name, image, and price. Adding an already-present product increments the
/// existing line.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddForm>,
) -> Result<Json<CartView>> {
    let quantity = form.quantity.unwrap_or(1);
    let product = state.store().get_product(form.product_id).await?;

    let mut cart = load_cart(&session).await?;
    cart.add(&product, quantity).map_err(cart_error)?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::build(&cart)?))
}

/// Set an item's quantity; zero removes the line.
#[instrument(skip(session))]
pub async fn update(session: Session, Json(form): Json<UpdateForm>) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.update_quantity(form.product_id, form.quantity);
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::build(&cart)?))
}

/// Remove an item from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Json(form): Json<RemoveForm>) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.remove(form.product_id);
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::build(&cart)?))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::build(&cart)?))
}

/// Item count for the cart badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CountView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CountView {
        count: cart.total_items(),
    }))
}

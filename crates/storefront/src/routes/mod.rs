//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (session store)
//!
//! # Products
//! GET  /products                  - Product listing (?category=, ?featured=)
//! GET  /products/{id}             - Product detail
//!
//! # Cart
//! GET  /cart                      - Cart with totals estimate
//! POST /cart/add                  - Add a product (increments existing line)
//! POST /cart/update               - Set a line quantity (0 removes)
//! POST /cart/remove               - Remove a line
//! POST /cart/clear                - Empty the cart
//! GET  /cart/count                - Item count badge
//!
//! # Checkout
//! GET  /checkout                  - Enter or resume the checkout flow
//! POST /checkout/shipping         - Submit shipping address -> Billing
//! POST /checkout/billing          - Submit billing address  -> Payment
//! POST /checkout/payment/intent   - (Re-)request a payment authorization
//! POST /checkout/payment          - Confirm payment         -> Review
//! POST /checkout/order            - Place the order
//! POST /checkout/back             - Step back by one
//! POST /checkout/cancel           - Abandon checkout, keep cart
//!
//! # Payment authorization (public contract)
//! POST /api/payment-intent        - Create a gateway authorization
//!
//! # Orders
//! GET  /orders/{id}               - Persisted order for confirmation
//! ```

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod payment;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/shipping", post(checkout::shipping))
        .route("/billing", post(checkout::billing))
        .route("/payment/intent", post(payment::refresh_intent))
        .route("/payment", post(payment::confirm))
        .route("/order", post(orders::place))
        .route("/back", post(checkout::back))
        .route("/cancel", post(checkout::cancel))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/{id}", get(orders::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/api/payment-intent", post(payment::create_payment_intent))
        .nest("/orders", order_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies session-store connectivity before returning OK.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

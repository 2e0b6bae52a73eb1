//! Session-stored shopper state.
//!
//! The durable session is the storefront's "client-side storage": the cart
//! and the in-progress checkout live under fixed keys, are re-written after
//! every mutation, and survive reloads via the session cookie. The checkout
//! blob is deleted only on successful order placement or explicit
//! cancellation, never on mere navigation away.

use tower_sessions::Session;

use crate::checkout::cart::Cart;
use crate::checkout::flow::CheckoutState;
use crate::error::Result;

/// Session keys for shopper state.
pub mod keys {
    /// Key for the cart blob.
    pub const CART: &str = "cart";

    /// Key for the in-progress checkout blob.
    pub const CHECKOUT_STATE: &str = "checkout_state";
}

/// Load the cart, defaulting to empty for a fresh session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Persist the cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(keys::CART, cart).await?;
    Ok(())
}

/// Remove the cart blob entirely.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_cart(session: &Session) -> Result<()> {
    session.remove::<Cart>(keys::CART).await?;
    Ok(())
}

/// Load the in-progress checkout, if one exists.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_checkout(session: &Session) -> Result<Option<CheckoutState>> {
    Ok(session.get::<CheckoutState>(keys::CHECKOUT_STATE).await?)
}

/// Persist the checkout state; called after every mutation.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_checkout(session: &Session, state: &CheckoutState) -> Result<()> {
    session.insert(keys::CHECKOUT_STATE, state).await?;
    Ok(())
}

/// Delete the checkout blob (successful order or explicit cancel).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_checkout(session: &Session) -> Result<()> {
    session.remove::<CheckoutState>(keys::CHECKOUT_STATE).await?;
    Ok(())
}

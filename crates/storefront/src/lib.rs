//! Fungal Flux Storefront library.
//!
//! This crate provides the storefront as a library so the whole router can
//! be driven in-process by tests, with the remote collaborators swapped for
//! fakes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod state;
pub mod store;

use axum::Router;
use tower_sessions::{SessionManagerLayer, SessionStore};

use state::AppState;

/// Assemble the full application router over the given state and session
/// layer.
///
/// The session layer is a parameter so production can use the
/// `PostgreSQL`-backed store while tests run on an in-memory one.
pub fn app<Store>(state: AppState, session_layer: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone + 'static,
{
    Router::new()
        .merge(routes::routes())
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(session_layer)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

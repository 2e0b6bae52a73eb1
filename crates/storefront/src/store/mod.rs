//! Hosted commerce store client.
//!
//! # Architecture
//!
//! - The remote store is the source of truth for products and orders; the
//!   storefront holds no local copies beyond a short-lived read cache.
//! - REST over `reqwest`; rows are mapped to domain types once, at the
//!   boundary in [`types`].
//! - Order creation is a single RPC that persists the order and its items
//!   atomically - it fully succeeds with one id or fully fails.
//! - [`CommerceStore`] is the seam: handlers and the submit path depend on
//!   the trait, so tests swap in an in-memory store.

mod client;
pub mod types;

pub use client::StoreClient;

use async_trait::async_trait;
use thiserror::Error;

use fungal_flux_core::{OrderId, ProductCategory, ProductId};

use types::{CreateOrderInput, Order, Product};

/// Errors that can occur when talking to the commerce store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Store-provided message, if any.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A row came back in a shape the mapping layer rejects.
    #[error("invalid row from store: {0}")]
    InvalidRow(String),
}

/// The remote commerce store, as the rest of the crate sees it.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    /// List products, optionally filtered to one category.
    async fn list_products(
        &self,
        category: Option<ProductCategory>,
    ) -> Result<Vec<Product>, StoreError>;

    /// Fetch one product by id.
    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError>;

    /// Atomically create an order and its items; returns the new order id.
    ///
    /// Idempotent on the payment intent id: a duplicate returns the id of
    /// the already-created order instead of recording a second one.
    async fn create_order(&self, input: &CreateOrderInput) -> Result<OrderId, StoreError>;

    /// Fetch one order with its items.
    async fn get_order(&self, id: OrderId) -> Result<Order, StoreError>;
}

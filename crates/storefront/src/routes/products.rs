//! Product catalog route handlers.
//!
//! Read-only views over the remote store's catalog; reads are cached by the
//! store client.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use fungal_flux_core::{ProductCategory, ProductId};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::types::Product;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<ProductCategory>,
    pub featured: Option<bool>,
}

/// List products, optionally filtered by category and featured flag.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let mut products = state.store().list_products(query.category).await?;
    if query.featured == Some(true) {
        products.retain(|p| p.featured);
    }
    Ok(Json(products))
}

/// Fetch one product by id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id: ProductId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid product id: {id}")))?;
    let product = state.store().get_product(id).await?;
    Ok(Json(product))
}

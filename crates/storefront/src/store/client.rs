//! REST client for the hosted commerce store.
//!
//! Speaks the store's row-filtering dialect (`?id=eq.{id}`, embedded
//! `order_items(*)`) with `reqwest`, and caches product reads in `moka`
//! (5-minute TTL). Order operations are never cached.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use uuid::Uuid;

use async_trait::async_trait;

use fungal_flux_core::{Money, OrderId, OrderNumber, ProductCategory, ProductId};

use crate::config::CommerceStoreConfig;
use crate::models::address::Address;
use crate::store::types::{CreateOrderInput, Order, OrderItemInput, OrderRow, Product, ProductRow};
use crate::store::{CommerceStore, StoreError};

/// Cached read results.
#[derive(Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}

/// Client for the hosted commerce store.
///
/// Cheaply cloneable; all clones share one HTTP connection pool and cache.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    cache: Cache<String, CacheValue>,
}

impl StoreClient {
    /// Create a new store client.
    #[must_use]
    pub fn new(config: &CommerceStoreConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        // A store that stops answering must surface as an error, not a hang.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            inner: Arc::new(StoreClientInner {
                client,
                base_url: config.api_url.trim_end_matches('/').to_string(),
                service_key: config.service_key.expose_secret().to_string(),
                cache,
            }),
        }
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.inner.base_url)
    }

    /// GET a JSON payload, mapping non-success statuses to [`StoreError`].
    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, StoreError> {
        let response = self
            .inner
            .client
            .get(self.url(path_and_query))
            .header("apikey", &self.inner.service_key)
            .bearer_auth(&self.inner.service_key)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// POST a JSON body, mapping non-success statuses to [`StoreError`].
    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .header("apikey", &self.inner.service_key)
            .bearer_auth(&self.inner.service_key)
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // The store reports errors as {"message": "..."}; fall back to a
            // truncated body when it does not.
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| text.chars().take(200).collect());
            tracing::error!(status = %status, message = %message, "store returned non-success status");
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "failed to parse store response"
            );
            StoreError::Parse(e)
        })
    }
}

/// Wire shape of the atomic `create_order` RPC.
#[derive(Serialize)]
struct CreateOrderRpc<'a> {
    p_order_number: &'a OrderNumber,
    p_shipping_address: &'a Address,
    p_billing_address: &'a Address,
    p_subtotal: Money,
    p_shipping_cost: Money,
    p_tax_amount: Money,
    p_total_amount: Money,
    p_payment_intent_id: &'a str,
    p_payment_method_last4: &'a str,
    p_order_notes: Option<&'a str>,
    p_items: &'a [OrderItemInput],
}

#[async_trait]
impl CommerceStore for StoreClient {
    #[instrument(skip(self))]
    async fn list_products(
        &self,
        category: Option<ProductCategory>,
    ) -> Result<Vec<Product>, StoreError> {
        let cache_key = format!(
            "products:{}",
            category.map_or("all", ProductCategory::as_str)
        );

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for product list");
            return Ok(products);
        }

        let mut query = "/rest/v1/products?select=*&order=name.asc".to_string();
        if let Some(category) = category {
            query.push_str("&category=eq.");
            query.push_str(category.as_str());
        }

        let rows: Vec<ProductRow> = self.get_json(&query).await?;
        let products = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for product");
            return Ok(*product);
        }

        let rows: Vec<ProductRow> = self
            .get_json(&format!("/rest/v1/products?select=*&id=eq.{id}&limit=1"))
            .await?;
        let product = rows
            .into_iter()
            .next()
            .map(Product::try_from)
            .transpose()?
            .ok_or_else(|| StoreError::NotFound(format!("product not found: {id}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    #[instrument(skip(self, input), fields(order_number = %input.order_number))]
    async fn create_order(&self, input: &CreateOrderInput) -> Result<OrderId, StoreError> {
        let body = CreateOrderRpc {
            p_order_number: &input.order_number,
            p_shipping_address: &input.shipping_address,
            p_billing_address: &input.billing_address,
            p_subtotal: input.subtotal,
            p_shipping_cost: input.shipping_cost,
            p_tax_amount: input.tax_amount,
            p_total_amount: input.total_amount,
            p_payment_intent_id: &input.payment_intent_id,
            p_payment_method_last4: &input.payment_method_last4,
            p_order_notes: input.order_notes.as_deref(),
            p_items: &input.items,
        };

        // The RPC inserts the order and all items in one transaction and
        // returns the order id; on a duplicate payment intent id it returns
        // the previously created order instead.
        let id: Uuid = self.post_json("/rest/v1/rpc/create_order", &body).await?;
        Ok(OrderId::new(id))
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: OrderId) -> Result<Order, StoreError> {
        let rows: Vec<OrderRow> = self
            .get_json(&format!(
                "/rest/v1/orders?select=*,order_items(*)&id=eq.{id}&limit=1"
            ))
            .await?;

        rows.into_iter()
            .next()
            .map(Order::try_from)
            .transpose()?
            .ok_or_else(|| StoreError::NotFound(format!("order not found: {id}")))
    }
}

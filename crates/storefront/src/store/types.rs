//! Domain types and wire rows for the hosted commerce store.
//!
//! The store speaks PostgREST-flavored JSON: numeric columns arrive as
//! decimal strings, money columns as integer cents. Rows are converted to
//! domain types exactly once, here, with validated parsing; nothing outside
//! this module touches a raw row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fungal_flux_core::{
    Money, OrderId, OrderItemId, OrderNumber, OrderStatus, PaymentStatus, ProductCategory,
    ProductId,
};

use crate::models::address::Address;
use crate::store::StoreError;

// =============================================================================
// Products
// =============================================================================

/// A catalog product snapshot. Owned by the remote store; the storefront
/// never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub category: ProductCategory,
    pub description: Option<String>,
    pub stock_quantity: u32,
    /// Derived: `stock_quantity > 0`.
    pub in_stock: bool,
    pub featured: bool,
}

/// A raw `products` row as returned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    /// Decimal string, e.g. `"24.99"`.
    pub price: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: ProductCategory,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub featured: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Money::parse(&row.price).map_err(|e| {
            StoreError::InvalidRow(format!("product {}: price {:?}: {e}", row.id, row.price))
        })?;
        let stock_quantity = u32::try_from(row.stock_quantity.max(0)).map_err(|_| {
            StoreError::InvalidRow(format!("product {}: stock_quantity out of range", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price,
            image_url: row.image_url,
            category: row.category,
            description: row.description,
            stock_quantity,
            in_stock: stock_quantity > 0,
            featured: row.featured,
        })
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A persisted, immutable order with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub payment_intent_id: Option<String>,
    pub payment_method_last4: Option<String>,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub tracking_number: Option<String>,
    pub order_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One persisted order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub total_price: Money,
}

/// A raw `orders` row with embedded `order_items`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub payment_method_last4: Option<String>,
    #[serde(default)]
    pub estimated_delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub order_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub order_items: Vec<OrderItemRow>,
}

/// A raw `order_items` row.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRow {
    pub id: Uuid,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    pub product_name: String,
    #[serde(default)]
    pub product_image: Option<String>,
    pub unit_price: i64,
    pub quantity: i64,
    pub total_price: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let order_number = OrderNumber::parse(&row.order_number).map_err(|e| {
            StoreError::InvalidRow(format!("order {}: order_number: {e}", row.id))
        })?;
        let items = row
            .order_items
            .into_iter()
            .map(OrderItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: OrderId::new(row.id),
            order_number,
            status: row.status,
            payment_status: row.payment_status,
            shipping_address: row.shipping_address,
            billing_address: row.billing_address,
            subtotal: Money::from_cents(row.subtotal),
            shipping_cost: Money::from_cents(row.shipping_cost),
            tax_amount: Money::from_cents(row.tax_amount),
            total_amount: Money::from_cents(row.total_amount),
            payment_intent_id: row.payment_intent_id,
            payment_method_last4: row.payment_method_last4,
            estimated_delivery_date: row.estimated_delivery_date,
            tracking_number: row.tracking_number,
            order_notes: row.order_notes,
            created_at: row.created_at,
            items,
        })
    }
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = StoreError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            StoreError::InvalidRow(format!("order item {}: quantity out of range", row.id))
        })?;

        Ok(Self {
            id: OrderItemId::new(row.id),
            product_id: row.product_id.map(ProductId::new),
            product_name: row.product_name,
            product_image: row.product_image,
            unit_price: Money::from_cents(row.unit_price),
            quantity,
            total_price: Money::from_cents(row.total_price),
        })
    }
}

// =============================================================================
// Order creation
// =============================================================================

/// One line of a new order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub total_price: Money,
}

/// Input for the atomic order-creation call.
///
/// The payment intent id doubles as the idempotency key: the store holds a
/// unique index on it and returns the existing order id for a duplicate, so
/// retrying after a failed response can never record the same payment twice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrderInput {
    pub order_number: OrderNumber,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub payment_intent_id: String,
    pub payment_method_last4: String,
    pub order_notes: Option<String>,
    pub items: Vec<OrderItemInput>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_row(price: &str, stock: i64) -> ProductRow {
        ProductRow {
            id: Uuid::new_v4(),
            name: "Blue Oyster Grow Kit".into(),
            price: price.into(),
            image_url: Some("/placeholder-mushroom.jpg".into()),
            category: ProductCategory::GrowKits,
            description: Some("Easy-to-grow Blue Oyster mushrooms.".into()),
            stock_quantity: stock,
            featured: true,
        }
    }

    #[test]
    fn test_product_price_parsed_once_into_cents() {
        let product = Product::try_from(product_row("19.99", 40)).unwrap();
        assert_eq!(product.price, Money::from_cents(1999));
        assert!(product.in_stock);
        assert_eq!(product.stock_quantity, 40);
    }

    #[test]
    fn test_product_bad_price_is_an_invalid_row() {
        let err = Product::try_from(product_row("19.9.9", 40)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRow(_)));
    }

    #[test]
    fn test_in_stock_derived_from_stock_quantity() {
        let product = Product::try_from(product_row("19.99", 0)).unwrap();
        assert!(!product.in_stock);
    }

    #[test]
    fn test_order_row_maps_to_domain() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "order_number": "FF-20240615-0481",
            "status": "pending",
            "payment_status": "completed",
            "shipping_address": sample_address_json(),
            "billing_address": sample_address_json(),
            "subtotal": 2499,
            "shipping_cost": 999,
            "tax_amount": 200,
            "total_amount": 3698,
            "payment_intent_id": "pi_test_123",
            "payment_method_last4": "4242",
            "created_at": "2024-06-15T17:30:00Z",
            "order_items": [{
                "id": Uuid::new_v4(),
                "product_id": Uuid::new_v4(),
                "product_name": "Lion's Mane Grow Kit",
                "unit_price": 2499,
                "quantity": 1,
                "total_price": 2499
            }]
        });
        let row: OrderRow = serde_json::from_value(json).unwrap();
        let order = Order::try_from(row).unwrap();

        assert_eq!(order.order_number.as_str(), "FF-20240615-0481");
        assert_eq!(order.subtotal, Money::from_cents(2499));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 1);
        assert_eq!(order.estimated_delivery_date, None);
    }

    #[test]
    fn test_order_row_with_bad_number_rejected() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "order_number": "BOGUS",
            "status": "pending",
            "payment_status": "pending",
            "shipping_address": sample_address_json(),
            "billing_address": sample_address_json(),
            "subtotal": 0,
            "shipping_cost": 0,
            "tax_amount": 0,
            "total_amount": 0,
            "created_at": "2024-06-15T17:30:00Z"
        });
        let row: OrderRow = serde_json::from_value(json).unwrap();
        assert!(matches!(Order::try_from(row), Err(StoreError::InvalidRow(_))));
    }

    fn sample_address_json() -> serde_json::Value {
        serde_json::json!({
            "full_name": "Mora Spore",
            "email": "mora@example.com",
            "phone": "5550102030",
            "address_line1": "123 Mycelium Way",
            "address_line2": null,
            "city": "Portland",
            "state": "OR",
            "postal_code": "97201",
            "country": "US"
        })
    }
}

//! The shopper's cart.
//!
//! An ordered collection of lines, each a product snapshot plus a quantity.
//! The cart does no I/O; handlers persist it to the session after every
//! mutation. Product details (name, image, unit price) are snapshotted at
//! add time so the cart stays coherent if the catalog changes underneath it.

use serde::{Deserialize, Serialize};

use fungal_flux_core::{Money, ProductId};

use crate::store::types::Product;

/// Errors from cart mutations and aggregations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    /// A line quantity must be at least 1.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// A line total or the cart total overflowed.
    #[error("cart total out of range")]
    Overflow,
}

/// One cart line: a product snapshot and a quantity of at least 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartLine {
    /// Line subtotal: unit price times quantity, exact.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if the multiplication overflows.
    pub fn line_total(&self) -> Result<Money, CartError> {
        self.unit_price
            .checked_mul(self.quantity)
            .ok_or(CartError::Overflow)
    }
}

/// The cart: ordered lines, one per product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add a product to the cart.
    ///
    /// If the product is already present the existing line's quantity is
    /// incremented; a product never appears on two lines.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] for a zero quantity and
    /// [`CartError::Overflow`] if the increment overflows.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or(CartError::Overflow)?;
        } else {
            self.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                image_url: product.image_url.clone(),
                unit_price: product.price,
                quantity,
            });
        }
        Ok(())
    }

    /// Set a line's quantity; zero removes the line entirely.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
        } else if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        }
    }

    /// Remove a line unconditionally.
    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The cart lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Total item count: the sum of line quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Total price: the sum of line subtotals, exact.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if any line or the sum overflows.
    pub fn total_price(&self) -> Result<Money, CartError> {
        self.lines.iter().try_fold(Money::ZERO, |acc, line| {
            acc.checked_add(line.line_total()?).ok_or(CartError::Overflow)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fungal_flux_core::ProductCategory;

    fn product(name: &str, cents: i64) -> Product {
        Product {
            id: ProductId::generate(),
            name: name.to_string(),
            price: Money::from_cents(cents),
            image_url: Some("/placeholder-mushroom.jpg".to_string()),
            category: ProductCategory::GrowKits,
            description: None,
            stock_quantity: 10,
            in_stock: true,
            featured: false,
        }
    }

    #[test]
    fn test_add_new_products_appends_lines() {
        let mut cart = Cart::default();
        cart.add(&product("Lion's Mane Grow Kit", 2499), 1).unwrap();
        cart.add(&product("Blue Oyster Grow Kit", 1999), 2).unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price().unwrap(), Money::from_cents(2499 + 2 * 1999));
    }

    #[test]
    fn test_add_same_product_twice_merges_quantities() {
        let kit = product("Shiitake Grow Kit", 2799);
        let mut cart = Cart::default();
        cart.add(&kit, 2).unwrap();
        cart.add(&kit, 3).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_add_zero_quantity_is_rejected() {
        let kit = product("Shiitake Grow Kit", 2799);
        let mut cart = Cart::default();
        assert_eq!(cart.add(&kit, 0), Err(CartError::ZeroQuantity));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_to_zero_removes_line() {
        let kit = product("Humidity Tent Kit", 2999);
        let culture = product("Shiitake Liquid Culture", 1899);
        let mut cart = Cart::default();
        cart.add(&kit, 4).unwrap();
        cart.add(&culture, 1).unwrap();

        let before = cart.total_items();
        cart.update_quantity(kit.id, 0);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total_items(), before - 4);
    }

    #[test]
    fn test_update_quantity_sets_exact_value() {
        let kit = product("Sterilization Kit", 4599);
        let mut cart = Cart::default();
        cart.add(&kit, 1).unwrap();
        cart.update_quantity(kit.id, 7);
        assert_eq!(cart.lines()[0].quantity, 7);
    }

    #[test]
    fn test_update_quantity_for_absent_product_is_noop() {
        let mut cart = Cart::default();
        cart.add(&product("Sterilization Kit", 4599), 1).unwrap();
        cart.update_quantity(ProductId::generate(), 3);
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let kit = product("Humidity Tent Kit", 2999);
        let mut cart = Cart::default();
        cart.add(&kit, 2).unwrap();
        cart.remove(kit.id);
        assert!(cart.is_empty());

        cart.add(&kit, 2).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price().unwrap(), Money::ZERO);
    }

    #[test]
    fn test_totals_track_any_interleaving() {
        let a = product("A", 2499);
        let b = product("B", 1899);
        let mut cart = Cart::default();

        cart.add(&a, 1).unwrap();
        cart.add(&b, 5).unwrap();
        cart.update_quantity(b.id, 2);
        cart.add(&a, 2).unwrap();
        cart.remove(b.id);
        cart.add(&b, 1).unwrap();

        let expected_items: u64 = cart.lines().iter().map(|l| u64::from(l.quantity)).sum();
        let expected_price = cart
            .lines()
            .iter()
            .map(|l| l.unit_price.cents() * i64::from(l.quantity))
            .sum::<i64>();

        assert_eq!(cart.total_items(), expected_items);
        assert_eq!(cart.total_price().unwrap().cents(), expected_price);
        assert_eq!(cart.total_items(), 4);
        assert_eq!(expected_price, 3 * 2499 + 1899);
    }

    #[test]
    fn test_overflow_is_reported_not_wrapped() {
        let pricey = product("Pricey", i64::MAX);
        let mut cart = Cart::default();
        cart.add(&pricey, 2).unwrap();
        assert_eq!(cart.total_price(), Err(CartError::Overflow));
    }
}

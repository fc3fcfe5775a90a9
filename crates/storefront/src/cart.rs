//! In-memory shopping cart.
//!
//! The cart maps product IDs to lines holding the product snapshot taken when
//! it was added. It is deliberately unaware of sessions: the guest check and
//! the abandoned-cart notification live in [`crate::state::Storefront`], which
//! owns both the cart and the session.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use dummymart_core::{Price, ProductId};

use crate::api::Product;

/// VAT rate applied to the cart subtotal, in percent.
pub const VAT_PERCENT: Decimal = Decimal::TEN;

/// Errors from cart mutations. The cart is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Only {stock} of {title} in stock")]
    ExceedsStock {
        title: String,
        requested: u32,
        stock: u32,
    },
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub product: Product,
    /// Always at least 1; a zero quantity removes the line.
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.unit_price() * self.quantity
    }

    /// Discount on this line: line total times the product's discount
    /// percentage.
    #[must_use]
    pub fn line_discount(&self) -> Price {
        self.line_total().percent(self.product.discount_percentage)
    }
}

/// Derived totals shown on the cart page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    pub subtotal: Price,
    /// 10 % of the subtotal, rounded to cents.
    pub vat: Price,
    pub discount: Price,
    /// `subtotal + vat - discount`.
    pub total: Price,
}

/// Clamp a requested quantity to `[0, product.stock]`.
#[must_use]
pub fn clamp_quantity(product: &Product, requested: i64) -> u32 {
    let clamped = requested.clamp(0, i64::from(product.stock));
    u32::try_from(clamped).unwrap_or(0)
}

/// Cart contents keyed by product ID, iterated in ascending ID order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartStore {
    lines: BTreeMap<ProductId, CartLine>,
    total_quantity: u32,
}

impl CartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quantity for a product.
    ///
    /// A zero quantity removes the line; anything else inserts or replaces it
    /// with `product` as the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ExceedsStock`] if `quantity` is above the
    /// product's stock. Use [`clamp_quantity`] first to avoid this.
    pub fn set_quantity(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            self.lines.remove(&product.id);
        } else {
            if quantity > product.stock {
                return Err(CartError::ExceedsStock {
                    title: product.title.clone(),
                    requested: quantity,
                    stock: product.stock,
                });
            }
            self.lines.insert(
                product.id,
                CartLine {
                    product: product.clone(),
                    quantity,
                },
            );
        }

        self.recompute();
        Ok(())
    }

    /// Remove a line, returning whether it existed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let removed = self.lines.remove(&id).is_some();
        self.recompute();
        removed
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.recompute();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub const fn total_quantity(&self) -> u32 {
        self.total_quantity
    }

    /// Quantity of a product, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, id: ProductId) -> u32 {
        self.lines.get(&id).map_or(0, |line| line.quantity)
    }

    #[must_use]
    pub fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.get(&id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let subtotal = self
            .lines()
            .fold(Price::zero(), |sum, line| sum + line.line_total());
        let discount = self
            .lines()
            .fold(Price::zero(), |sum, line| sum + line.line_discount());
        let vat = subtotal.percent(VAT_PERCENT).rounded();
        let total = Price::usd(subtotal.amount + vat.amount - discount.amount);

        CartSummary {
            subtotal,
            vat,
            discount,
            total,
        }
    }

    fn recompute(&mut self) {
        self.total_quantity = self.lines.values().map(|line| line.quantity).sum();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ProductInfo;

    fn product(id: i32, cents: i64, discount_bp: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: String::new(),
            category: "misc".to_string(),
            price: Decimal::new(cents, 2),
            discount_percentage: Decimal::new(discount_bp, 2),
            rating: 4.0,
            stock,
            brand: None,
            thumbnail: None,
            images: Vec::new(),
            info: ProductInfo::default(),
        }
    }

    #[test]
    fn test_set_quantity_creates_single_line() {
        let mut cart = CartStore::new();
        let p = product(3, 999, 0, 10);

        cart.set_quantity(&p, 2).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(p.id), 2);
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_set_quantity_replaces_existing_line() {
        let mut cart = CartStore::new();
        let p = product(3, 999, 0, 10);

        cart.set_quantity(&p, 2).unwrap();
        cart.set_quantity(&p, 5).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_zero_quantity_removes_line() {
        let mut cart = CartStore::new();
        let p = product(3, 999, 0, 10);

        cart.set_quantity(&p, 2).unwrap();
        cart.set_quantity(&p, 0).unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.total_quantity(), 0);
        assert!(cart.line(p.id).is_none());
    }

    #[test]
    fn test_zero_quantity_on_absent_line_is_noop() {
        let mut cart = CartStore::new();
        cart.set_quantity(&product(1, 100, 0, 1), 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_above_stock_is_rejected() {
        let mut cart = CartStore::new();
        let p = product(3, 999, 0, 4);
        cart.set_quantity(&p, 1).unwrap();

        let err = cart.set_quantity(&p, 5).unwrap_err();
        assert!(matches!(err, CartError::ExceedsStock { stock: 4, .. }));
        assert_eq!(cart.quantity_of(p.id), 1);
    }

    #[test]
    fn test_total_quantity_tracks_every_mutation() {
        let mut cart = CartStore::new();
        let products: Vec<_> = (1..=5).map(|id| product(id, 100, 0, 50)).collect();

        for (i, p) in products.iter().enumerate() {
            cart.set_quantity(p, u32::try_from(i).unwrap() + 1).unwrap();
            let expected: u32 = cart.lines().map(|line| line.quantity).sum();
            assert_eq!(cart.total_quantity(), expected);
        }
        assert_eq!(cart.total_quantity(), 15);

        cart.remove(products[4].id);
        assert_eq!(cart.total_quantity(), 10);

        cart.clear();
        assert_eq!(cart.total_quantity(), 0);
    }

    #[test]
    fn test_lines_iterate_in_id_order() {
        let mut cart = CartStore::new();
        for id in [9, 2, 5] {
            cart.set_quantity(&product(id, 100, 0, 5), 1).unwrap();
        }
        let ids: Vec<i32> = cart.lines().map(|line| line.product.id.as_i32()).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn test_summary() {
        let mut cart = CartStore::new();
        // $9.99 x 2 with 10% off, $20.00 x 1 with 5% off
        cart.set_quantity(&product(1, 999, 1000, 10), 2).unwrap();
        cart.set_quantity(&product(2, 2000, 500, 10), 1).unwrap();

        let summary = cart.summary();
        assert_eq!(summary.subtotal.to_string(), "$39.98");
        assert_eq!(summary.vat.amount, Decimal::new(400, 2));
        // 19.98 * 0.10 + 20.00 * 0.05
        assert_eq!(summary.discount.amount, Decimal::new(2998, 3));
        assert_eq!(summary.total.amount, Decimal::new(40982, 3));
        assert_eq!(summary.total.to_string(), "$40.98");
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = CartStore::new().summary();
        assert_eq!(summary.total, Price::zero());
        assert_eq!(summary.vat, Price::zero());
    }

    #[test]
    fn test_clamp_quantity() {
        let p = product(1, 100, 0, 3);
        assert_eq!(clamp_quantity(&p, -1), 0);
        assert_eq!(clamp_quantity(&p, 2), 2);
        assert_eq!(clamp_quantity(&p, 10), 3);
    }
}

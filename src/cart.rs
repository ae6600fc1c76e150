//! Cart
//!
//! An owner's cart: insertion-ordered lines, at most one line per product.
//! Each line snapshots the product's name and pricing at add time and keeps
//! the product id as a back-reference for refreshing display data.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{money::apply_percentage_discount, products::Product};

/// Errors related to cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// A quantity below one was supplied.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// No line exists for the given product.
    #[error("no cart line for product {0}")]
    LineNotFound(String),
}

/// A single cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Back-reference to the catalog product.
    pub product_id: String,

    /// Product name at add time.
    pub name: String,

    /// Base unit price at add time.
    pub unit_price: Decimal,

    /// Product-level percentage discount at add time.
    #[serde(default)]
    pub discount_percent: Option<Decimal>,

    /// Number of units, always at least one.
    pub quantity: u32,
}

impl CartLine {
    /// The unit price after the product's own percentage discount.
    pub fn discounted_unit_price(&self) -> Decimal {
        match self.discount_percent {
            Some(percent) if percent > Decimal::ZERO => {
                apply_percentage_discount(self.unit_price, percent)
            }
            _ => self.unit_price,
        }
    }

    /// The line total: discounted unit price times quantity.
    pub fn total(&self) -> Decimal {
        self.discounted_unit_price() * Decimal::from(self.quantity)
    }
}

/// Cart
///
/// An empty cart is valid and distinct from "no cart": loading an owner with
/// no stored cart yields `None` from the store, not `Some(Cart::default())`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: SmallVec<[CartLine; 4]>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Cart::default()
    }

    /// Add `quantity` units of a product.
    ///
    /// If a line for the product already exists its quantity is incremented;
    /// otherwise a new line is appended, snapshotting the product's name and
    /// pricing.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] when `quantity` is zero.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        if let Some(line) = self.line_mut(&product.id) {
            line.quantity += quantity;
            return Ok(());
        }

        self.lines.push(CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            discount_percent: product.discount_percent,
            quantity,
        });

        Ok(())
    }

    /// Set a line's quantity directly.
    ///
    /// A quantity of zero behaves as [`Cart::remove_item`] and never fails.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] when setting a non-zero quantity
    /// on a product that has no line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            self.remove_item(product_id);
            return Ok(());
        }

        let line = self
            .line_mut(product_id)
            .ok_or_else(|| CartError::LineNotFound(product_id.to_owned()))?;

        line.quantity = quantity;

        Ok(())
    }

    /// Remove a product's line.
    ///
    /// Removing an absent line is a no-op; the return value reports whether
    /// anything was actually removed.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);

        self.lines.len() != before
    }

    /// Remove all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// The pre-coupon subtotal: per-line discounted unit price times
    /// quantity, summed in insertion order.
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::total).sum()
    }

    /// Total number of units across all lines, not the number of lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// The line for a product, if present.
    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: &str) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }

    /// The lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

//! Products
//!
//! Canonical product and category records, plus the one-shot normalization
//! step that turns loosely-typed document-store records into them. The rest
//! of the crate only ever sees already-normalized values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::apply_percentage_discount;

/// Errors raised while normalizing a raw catalog record.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The record has no usable display name.
    #[error("product {0} has no name")]
    MissingName(String),

    /// The record has no usable base price.
    #[error("product {0} has no price")]
    MissingPrice(String),

    /// The record carries a negative base price.
    #[error("product {0} has a negative price")]
    NegativePrice(String),
}

/// A catalog product, read-only from the cart's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Base price, non-negative.
    pub price: Decimal,

    /// Product-level percentage discount in `[0, 100]`, if any.
    pub discount_percent: Option<Decimal>,

    /// Category identifier.
    pub category: String,

    /// Featured on the storefront.
    pub featured: bool,

    /// Currently on sale.
    pub on_sale: bool,

    /// Marked popular.
    pub popular: bool,

    /// Units in stock.
    pub stock: u32,

    /// Rating in `[0, 5]`, if rated.
    pub rating: Option<Decimal>,
}

impl Product {
    /// The unit price after the product's own percentage discount.
    ///
    /// This is independent of any coupon; coupons apply to the cart total.
    pub fn discounted_price(&self) -> Decimal {
        match self.discount_percent {
            Some(percent) if percent > Decimal::ZERO => {
                apply_percentage_discount(self.price, percent)
            }
            _ => self.price,
        }
    }
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Category identifier.
    pub id: String,

    /// Display name.
    #[serde(alias = "nombre")]
    pub name: String,

    /// Optional description.
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,

    /// Optional icon reference.
    #[serde(default, alias = "icono")]
    pub icon: Option<String>,

    /// Whether the category is visible. Defaults to true.
    #[serde(default = "default_true", alias = "activa")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// A boolean-ish value as stored by the document database, where the same
/// semantic flag may arrive as `true`, `"true"` or `1`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFlag {
    /// A proper boolean.
    Bool(bool),

    /// A numeric flag; any non-zero value counts as set.
    Number(i64),

    /// A textual flag; `"true"` and `"1"` count as set.
    Text(String),
}

impl RawFlag {
    /// Collapse the raw value into a canonical boolean.
    pub fn as_bool(&self) -> bool {
        match self {
            RawFlag::Bool(value) => *value,
            RawFlag::Number(value) => *value != 0,
            RawFlag::Text(value) => value.eq_ignore_ascii_case("true") || value == "1",
        }
    }
}

fn flag(value: Option<&RawFlag>) -> bool {
    value.is_some_and(RawFlag::as_bool)
}

/// A product record as it comes out of the document store, with legacy
/// field names still attached.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    /// Document identifier.
    pub id: String,

    /// Display name, under either the current or the legacy field name.
    #[serde(default, alias = "nombre", alias = "title")]
    pub name: Option<String>,

    /// Base price.
    #[serde(default, alias = "precio")]
    pub price: Option<Decimal>,

    /// Product-level percentage discount.
    #[serde(default, alias = "descuento")]
    pub discount: Option<Decimal>,

    /// Category identifier.
    #[serde(default, alias = "categoria")]
    pub category: Option<String>,

    /// Featured flag.
    #[serde(default, alias = "destacado")]
    pub featured: Option<RawFlag>,

    /// On-sale flag.
    #[serde(default, rename = "onSale", alias = "enDescuento")]
    pub on_sale: Option<RawFlag>,

    /// Popular flag.
    #[serde(default)]
    pub popular: Option<RawFlag>,

    /// Stock count.
    #[serde(default)]
    pub stock: Option<u32>,

    /// Rating.
    #[serde(default)]
    pub rating: Option<Decimal>,
}

impl RawProduct {
    /// Normalize the raw record into a canonical [`Product`].
    ///
    /// Field fallbacks and flag coercion happen here, once per record, so
    /// downstream code never re-derives them.
    ///
    /// # Errors
    ///
    /// Returns a [`NormalizeError`] when the record lacks a name or price,
    /// or carries a negative price.
    pub fn normalize(self) -> Result<Product, NormalizeError> {
        let name = self
            .name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| NormalizeError::MissingName(self.id.clone()))?;

        let price = self
            .price
            .ok_or_else(|| NormalizeError::MissingPrice(self.id.clone()))?;

        if price < Decimal::ZERO {
            return Err(NormalizeError::NegativePrice(self.id));
        }

        let discount_percent = self
            .discount
            .filter(|discount| *discount > Decimal::ZERO)
            .map(|discount| discount.min(Decimal::ONE_HUNDRED));

        let rating = self
            .rating
            .map(|rating| rating.max(Decimal::ZERO).min(Decimal::from(5)));

        Ok(Product {
            id: self.id,
            name,
            price,
            discount_percent,
            category: self.category.unwrap_or_else(|| "otros".to_owned()),
            featured: flag(self.featured.as_ref()),
            on_sale: flag(self.on_sale.as_ref()),
            popular: flag(self.popular.as_ref()),
            stock: self.stock.unwrap_or(0),
            rating,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn raw(value: serde_json::Value) -> TestResult<RawProduct> {
        Ok(serde_json::from_value(value)?)
    }

    #[test]
    fn normalizes_legacy_field_names() -> TestResult {
        let product = raw(json!({
            "id": "p1",
            "nombre": "Teclado",
            "precio": "89.99",
            "descuento": 10,
            "categoria": "tecnologia",
        }))?
        .normalize()?;

        assert_eq!(product.name, "Teclado");
        assert_eq!(product.price, Decimal::new(8_999, 2));
        assert_eq!(product.discount_percent, Some(Decimal::from(10)));
        assert_eq!(product.category, "tecnologia");

        Ok(())
    }

    #[test]
    fn flag_coercion_accepts_bool_string_and_number() -> TestResult {
        let product = raw(json!({
            "id": "p2",
            "name": "Balón",
            "price": 30,
            "destacado": true,
            "enDescuento": "true",
            "popular": 1,
        }))?
        .normalize()?;

        assert!(product.featured);
        assert!(product.on_sale);
        assert!(product.popular);

        Ok(())
    }

    #[test]
    fn unset_and_falsy_flags_normalize_to_false() -> TestResult {
        let product = raw(json!({
            "id": "p3",
            "name": "Libro",
            "price": 12,
            "enDescuento": "false",
            "popular": 0,
        }))?
        .normalize()?;

        assert!(!product.featured);
        assert!(!product.on_sale);
        assert!(!product.popular);

        Ok(())
    }

    #[test]
    fn missing_name_is_an_error() -> TestResult {
        let result = raw(json!({ "id": "p4", "price": 10 }))?.normalize();

        assert!(matches!(result, Err(NormalizeError::MissingName(id)) if id == "p4"));

        Ok(())
    }

    #[test]
    fn missing_price_is_an_error() -> TestResult {
        let result = raw(json!({ "id": "p5", "nombre": "Silla" }))?.normalize();

        assert!(matches!(result, Err(NormalizeError::MissingPrice(id)) if id == "p5"));

        Ok(())
    }

    #[test]
    fn negative_price_is_an_error() -> TestResult {
        let result = raw(json!({ "id": "p6", "name": "Mesa", "price": -1 }))?.normalize();

        assert!(matches!(result, Err(NormalizeError::NegativePrice(id)) if id == "p6"));

        Ok(())
    }

    #[test]
    fn zero_discount_normalizes_to_none() -> TestResult {
        let product = raw(json!({
            "id": "p7",
            "name": "Audífonos",
            "price": 50,
            "descuento": 0,
        }))?
        .normalize()?;

        assert_eq!(product.discount_percent, None);
        assert_eq!(product.discounted_price(), Decimal::from(50));

        Ok(())
    }

    #[test]
    fn discounted_price_applies_product_discount() -> TestResult {
        let product = raw(json!({
            "id": "p8",
            "name": "Monitor",
            "price": 100,
            "discount": 25,
        }))?
        .normalize()?;

        assert_eq!(product.discounted_price(), Decimal::from(75));

        Ok(())
    }

    #[test]
    fn category_deserializes_legacy_fields() -> TestResult {
        let category: Category = serde_json::from_value(json!({
            "id": "deportes",
            "nombre": "Deportes",
            "descripcion": "Productos de deportes",
        }))?;

        assert_eq!(category.name, "Deportes");
        assert!(category.active);

        Ok(())
    }
}

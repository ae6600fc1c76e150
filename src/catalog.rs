//! Catalog
//!
//! Read-only access to products, categories and the coupon directory. The
//! core never mutates catalog data; hosting applications implement these
//! traits over whatever backend they use. [`MemoryCatalog`] is the bundled
//! implementation for tests and standalone use.

use std::io;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{
    categories::CategoryNames,
    coupons::Coupon,
    products::{Category, Product},
};

/// Errors from catalog reads.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product exists with the given identifier.
    #[error("product {0} not found")]
    NotFound(String),

    /// The catalog backend could not be reached.
    #[error("catalog unavailable")]
    Unavailable(#[from] io::Error),
}

/// Criteria for narrowing a product listing. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Match a category identifier exactly (case-insensitively).
    pub category: Option<String>,

    /// Match the featured flag.
    pub featured: Option<bool>,

    /// Match the on-sale flag.
    pub on_sale: Option<bool>,

    /// Match the popular flag.
    pub popular: Option<bool>,

    /// Case-insensitive substring match against the product name.
    pub search: Option<String>,
}

impl ProductFilter {
    /// Whether a product satisfies every set criterion.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category
            && !product.category.eq_ignore_ascii_case(category)
        {
            return false;
        }

        if self.featured.is_some_and(|wanted| product.featured != wanted)
            || self.on_sale.is_some_and(|wanted| product.on_sale != wanted)
            || self.popular.is_some_and(|wanted| product.popular != wanted)
        {
            return false;
        }

        if let Some(search) = &self.search {
            let name = product.name.to_lowercase();
            return name.contains(&search.to_lowercase());
        }

        true
    }
}

/// Read interface over the product catalog.
#[automock]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// List products matching the filter, in catalog order.
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError>;

    /// Fetch a single product by identifier.
    async fn get_product(&self, id: &str) -> Result<Product, CatalogError>;

    /// List visible categories.
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError>;
}

/// Read interface over the coupon directory.
#[automock]
#[async_trait]
pub trait CouponDirectory: Send + Sync {
    /// Find a coupon by code, matching case-insensitively.
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, CatalogError>;

    /// List all coupons.
    async fn list_coupons(&self) -> Result<Vec<Coupon>, CatalogError>;
}

/// An in-memory catalog over already-normalized records.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: Vec<Product>,
    categories: Vec<Category>,
    coupons: Vec<Coupon>,
    names: CategoryNames,
}

impl MemoryCatalog {
    /// Build a catalog from normalized products and coupons, with no
    /// explicit category records.
    pub fn new(products: Vec<Product>, coupons: Vec<Coupon>) -> Self {
        MemoryCatalog {
            products,
            categories: Vec::new(),
            coupons,
            names: CategoryNames::default(),
        }
    }

    /// Attach explicit category records.
    #[must_use]
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Use a custom display-name table for derived categories.
    #[must_use]
    pub fn with_category_names(mut self, names: CategoryNames) -> Self {
        self.names = names;
        self
    }

    /// Categories derived from the distinct product category identifiers,
    /// used when no explicit category records exist.
    fn derived_categories(&self) -> Vec<Category> {
        let mut seen = Vec::new();

        for product in &self.products {
            if seen.contains(&product.category) {
                continue;
            }
            seen.push(product.category.clone());
        }

        seen.into_iter()
            .map(|id| {
                let name = self.names.display_name(&id);
                let description = format!("Productos de {}", name.to_lowercase());

                Category {
                    id,
                    name,
                    description: Some(description),
                    icon: None,
                    active: true,
                }
            })
            .collect()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        Ok(self
            .products
            .iter()
            .filter(|product| filter.matches(product))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: &str) -> Result<Product, CatalogError> {
        self.products
            .iter()
            .find(|product| product.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_owned()))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        if self.categories.is_empty() {
            return Ok(self.derived_categories());
        }

        Ok(self
            .categories
            .iter()
            .filter(|category| category.active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CouponDirectory for MemoryCatalog {
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, CatalogError> {
        Ok(self
            .coupons
            .iter()
            .find(|coupon| coupon.matches_code(code))
            .cloned())
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>, CatalogError> {
        Ok(self.coupons.clone())
    }
}

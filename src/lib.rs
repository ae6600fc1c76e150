//! Tienda
//!
//! Tienda is a storefront cart and coupon engine: product and category
//! normalization, cart aggregation, coupon validation and discount
//! computation, and per-owner persistence of carts and claimed coupons.
//! Catalog and storage backends plug in behind the [`catalog`] and
//! [`store`] traits.

pub mod cart;
pub mod catalog;
pub mod categories;
pub mod claims;
pub mod coupons;
pub mod money;
pub mod prelude;
pub mod products;
pub mod session;
pub mod store;

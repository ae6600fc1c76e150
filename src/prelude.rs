//! Tienda prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLine},
    catalog::{Catalog, CatalogError, CouponDirectory, MemoryCatalog, ProductFilter},
    categories::CategoryNames,
    claims::{ClaimError, ClaimedCoupon},
    coupons::{Coupon, CouponError, CouponEvaluation, CouponKind, CouponSummary, canonical_code},
    money::{apply_fixed_discount, apply_percentage_discount, percentage_of},
    products::{Category, NormalizeError, Product, RawFlag, RawProduct},
    session::{CartSession, CouponService},
    store::{JsonFileStore, MemoryStore, Store, StoreError},
};

//! Coupons
//!
//! Coupon records and the stateless validation/discount computation. The
//! checks run in a fixed order and the first failure wins, so callers always
//! get the most specific error for the state the coupon is in.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::percentage_of;

/// Errors from coupon lookup and validation. All are user-facing and
/// recoverable.
#[derive(Debug, Error)]
pub enum CouponError {
    /// No coupon exists for the submitted code.
    #[error("coupon not found")]
    NotFound,

    /// The coupon is deactivated or already used.
    #[error("coupon is inactive or already used")]
    Inactive,

    /// The coupon's expiration timestamp has passed.
    #[error("coupon has expired")]
    Expired,

    /// The cart total is below the coupon's minimum purchase.
    #[error("minimum purchase of {required} not met")]
    MinimumPurchaseNotMet {
        /// The minimum cart total the coupon requires.
        required: Decimal,
    },

    /// The coupon directory could not be reached.
    #[error("coupon directory unavailable")]
    Unavailable(#[source] std::io::Error),
}

/// How a coupon's discount value is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponKind {
    /// The value is a percentage of the cart total.
    #[default]
    Percentage,

    /// The value is a fixed amount off the cart total.
    Fixed,
}

/// Canonicalize a coupon code for comparison.
pub fn canonical_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// A discount coupon.
///
/// Field aliases cover the legacy document-store names so records normalize
/// at deserialization. The discount kind is read from the record and only
/// defaults to percentage when the field is absent entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    /// The coupon code; compared case-insensitively.
    #[serde(alias = "codigo")]
    pub code: String,

    /// Discount kind.
    #[serde(default, rename = "type")]
    pub kind: CouponKind,

    /// Discount value: a percentage in `[0, 100]` or a fixed amount.
    #[serde(alias = "descuento")]
    pub value: Decimal,

    /// Cap on the computed discount. Only meaningful for percentage kind.
    #[serde(default, rename = "maxDiscount", alias = "descuentoMaximo")]
    pub max_discount: Option<Decimal>,

    /// Minimum cart total required to redeem, inclusive. Defaults to zero.
    #[serde(default, rename = "minPurchase", alias = "compraMinima")]
    pub min_purchase: Decimal,

    /// Expiration timestamp; absent means the coupon never expires.
    #[serde(default, rename = "validUntil", alias = "fechaVencimiento")]
    pub expires_at: Option<Timestamp>,

    /// Whether the coupon is redeemable at all. Defaults to true.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Whether the coupon has already been redeemed.
    #[serde(default)]
    pub used: bool,

    /// Informational redemption cap; not enforced here.
    #[serde(default, rename = "usageLimit", alias = "limiteUso")]
    pub usage_limit: Option<u32>,

    /// Informational redemption count; not enforced here.
    #[serde(default, rename = "usedCount", alias = "vecesUsado")]
    pub used_count: u32,
}

fn default_active() -> bool {
    true
}

/// The sanitized coupon fields safe to echo back to a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponSummary {
    /// The canonical coupon code.
    pub code: String,

    /// Discount kind.
    #[serde(rename = "type")]
    pub kind: CouponKind,

    /// Discount value.
    pub discount: Decimal,

    /// Expiration timestamp, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<Timestamp>,
}

/// A successful coupon evaluation.
///
/// Serializes with the wire field names the storefront API already uses
/// (`discountAmount`, `finalTotal`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponEvaluation {
    /// Sanitized coupon info for display.
    pub coupon: CouponSummary,

    /// The amount taken off the cart total.
    pub discount_amount: Decimal,

    /// The cart total after the discount; never negative.
    pub final_total: Decimal,
}

impl Coupon {
    /// Whether the submitted code matches this coupon, case-insensitively.
    pub fn matches_code(&self, code: &str) -> bool {
        canonical_code(&self.code) == canonical_code(code)
    }

    /// Validate the coupon against a cart total and compute the discount.
    ///
    /// Checks run in order: active/used, expiry, minimum purchase. A cart
    /// total exactly at the minimum passes. A valid coupon with a zero value
    /// yields a zero discount.
    ///
    /// # Errors
    ///
    /// Returns the [`CouponError`] for the first failed check.
    pub fn evaluate(
        &self,
        cart_total: Decimal,
        now: Timestamp,
    ) -> Result<CouponEvaluation, CouponError> {
        if !self.active || self.used {
            return Err(CouponError::Inactive);
        }

        if let Some(expires_at) = self.expires_at
            && now > expires_at
        {
            return Err(CouponError::Expired);
        }

        if cart_total < self.min_purchase {
            return Err(CouponError::MinimumPurchaseNotMet {
                required: self.min_purchase,
            });
        }

        let discount_amount = match self.kind {
            CouponKind::Percentage => {
                let raw = percentage_of(cart_total, self.value);
                self.max_discount.map_or(raw, |cap| raw.min(cap))
            }
            // A fixed discount may not push the total below zero.
            CouponKind::Fixed => self.value.max(Decimal::ZERO).min(cart_total),
        };

        Ok(CouponEvaluation {
            coupon: CouponSummary {
                code: canonical_code(&self.code),
                kind: self.kind,
                discount: self.value,
                valid_until: self.expires_at,
            },
            discount_amount,
            final_total: cart_total - discount_amount,
        })
    }
}

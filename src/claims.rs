//! Claims
//!
//! A claimed coupon is a snapshot of the coupon bound to an owner at claim
//! time. Owners hold at most one claim per code; duplicates are rejected,
//! never overwritten.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    coupons::{Coupon, canonical_code},
    store::StoreError,
};

/// Errors raised while claiming or releasing coupons.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The owner already holds a claim for this code.
    #[error("coupon {code} already claimed")]
    AlreadyClaimed {
        /// The canonical code of the duplicate claim.
        code: String,
    },

    /// The claim could not be recorded.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A coupon claimed by one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimedCoupon {
    /// Canonical coupon code; unique per owner.
    pub code: String,

    /// Snapshot of the coupon at claim time.
    pub coupon: Coupon,

    /// When the claim was made.
    pub claimed_at: Timestamp,

    /// Whether the claim has been redeemed.
    pub used: bool,
}

impl ClaimedCoupon {
    /// Snapshot a coupon as claimed at `now`.
    pub fn new(coupon: Coupon, now: Timestamp) -> Self {
        ClaimedCoupon {
            code: canonical_code(&coupon.code),
            coupon,
            claimed_at: now,
            used: false,
        }
    }

    /// Whether this claim is for the given code, case-insensitively.
    pub fn matches_code(&self, code: &str) -> bool {
        self.code == canonical_code(code)
    }
}

//! Money
//!
//! Pure discount arithmetic over [`Decimal`] amounts. These helpers never
//! return a negative amount; callers pass already-normalized inputs.

use rust_decimal::Decimal;

/// Clamp a percentage into the `[0, 100]` range.
fn clamp_percent(percent: Decimal) -> Decimal {
    percent.max(Decimal::ZERO).min(Decimal::ONE_HUNDRED)
}

/// Calculate `percent` of `total`.
///
/// The percentage is clamped to `[0, 100]` before applying, so the result
/// is always within `[0, total]` for a non-negative `total`.
pub fn percentage_of(total: Decimal, percent: Decimal) -> Decimal {
    total * clamp_percent(percent) / Decimal::ONE_HUNDRED
}

/// Apply a percentage discount to a base price.
///
/// A percentage of zero (or below) leaves the price unchanged; a percentage
/// of one hundred (or above) reduces it to zero.
pub fn apply_percentage_discount(base: Decimal, percent: Decimal) -> Decimal {
    (base - percentage_of(base, percent)).max(Decimal::ZERO)
}

/// Apply a fixed-amount discount to a base price.
///
/// The discount is limited to `cap` when one is given, and the result is
/// floored at zero so a discount can never make the price negative.
pub fn apply_fixed_discount(base: Decimal, amount: Decimal, cap: Option<Decimal>) -> Decimal {
    let amount = amount.max(Decimal::ZERO);
    let discount = cap.map_or(amount, |cap| amount.min(cap.max(Decimal::ZERO)));

    (base - discount).max(Decimal::ZERO)
}

//! Pure derivation of cart totals.
//!
//! Recomputed on every read from current aggregate state - no caching, no
//! invalidation. No side effects, no I/O.

use rust_decimal::Decimal;

use crate::item::{Coupon, LineItem};

/// Sum of `unit_price x quantity` over all cart lines.
#[must_use]
pub fn subtotal(items: &[LineItem]) -> Decimal {
    items
        .iter()
        .map(|line| line.unit_price.amount * Decimal::from(line.quantity))
        .sum()
}

/// Final total after the active coupon, clamped at zero.
///
/// The discount may exceed the subtotal; the result is never negative.
#[must_use]
pub fn total_after_coupon(subtotal: Decimal, coupon: Option<&Coupon>) -> Decimal {
    coupon.map_or(subtotal, |coupon| {
        (subtotal - coupon.discount.amount).max(Decimal::ZERO)
    })
}

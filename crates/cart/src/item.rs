//! Domain types for the cart and wishlist collections.
//!
//! These types are what the snapshot store persists and what crosses the
//! wire to the remote cart store.

use copper_otter_core::{Price, ProductCategory, VariantId};
use serde::{Deserialize, Serialize};
use url::Url;

/// A purchasable line in the cart or wishlist.
///
/// Identity is `id`. While a line is present in the cart its quantity is
/// at least 1; a line whose quantity would drop below 1 is removed, never
/// stored at 0. Wishlist entries carry no quantity semantics (presence only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Variant this line refers to.
    pub id: VariantId,
    /// Product title (e.g., "Pixel 9").
    pub title: String,
    /// Secondary display line (e.g., "128 GB / Obsidian").
    pub subtitle: String,
    /// Price for a single unit.
    pub unit_price: Price,
    /// Product image shown next to the line.
    pub image: Url,
    /// Category, forwarded to the remote store with every mutation.
    pub category: ProductCategory,
    /// Units of this variant in the cart.
    pub quantity: u32,
}

/// An applied discount code.
///
/// At most one coupon is active at a time; applying a new one replaces any
/// existing one. The discount may exceed the subtotal - the final total is
/// clamped at zero, never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// The code the customer entered, as validated upstream.
    pub code: String,
    /// Absolute discount taken off the subtotal.
    pub discount: Price,
}

/// Wire tuple for a single remote cart write.
///
/// Sent as the body of the per-line PUT and, batched, as the merge request.
/// `quantity == 0` is the removal signal - the remote store interprets it
/// as delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMutation {
    /// Variant the write applies to.
    pub id: VariantId,
    /// Category the remote store keys its merge policy on.
    pub product_type: ProductCategory,
    /// Absolute quantity to set; 0 deletes the line.
    pub quantity: u32,
}

impl LineMutation {
    /// Build the merge tuple for a line currently in the cart.
    #[must_use]
    pub const fn for_line(line: &LineItem) -> Self {
        Self {
            id: line.id,
            product_type: line.category,
            quantity: line.quantity,
        }
    }
}

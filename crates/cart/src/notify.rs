//! Notification sink for user-visible cart actions.
//!
//! The host's toast layer implements [`NoticeSink`] to surface add/remove/
//! coupon outcomes. Background synchronization (snapshot writes, debounced
//! remote writes, merge) never produces a notice - those failures are logged
//! and swallowed inside the engine.

/// A user-visible cart event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An item was added to the cart.
    ItemAdded { title: String },
    /// An item was removed from the cart.
    ItemRemoved { title: String },
    /// An item was moved from the cart to the wishlist.
    MovedToWishlist { title: String },
    /// An item was moved from the wishlist to the cart.
    MovedToCart { title: String },
    /// A coupon was applied.
    CouponApplied { code: String },
    /// The active coupon was removed.
    CouponRemoved,
    /// The cart was emptied.
    CartCleared,
}

/// Receiver for user-visible cart events.
pub trait NoticeSink: Send + Sync {
    /// Called synchronously from the mutation path; implementations must not
    /// block.
    fn notify(&self, notice: Notice);
}

/// Sink that drops every notice.
///
/// Default for hosts without a toast layer and for tests that don't assert
/// on notices.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NoticeSink for NullSink {
    fn notify(&self, _notice: Notice) {}
}

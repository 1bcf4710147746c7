//! The in-memory cart aggregate and its mutation surface.
//!
//! `CartService` owns the cart and wishlist collections, the coupon, and the
//! cart-visibility flag. Every mutation updates in-memory state and persists
//! the local snapshot synchronously, then - only when a customer is signed
//! in - schedules remote work. Mutation calls never await, so the UI never
//! blocks on network latency; the in-memory state is always authoritative
//! for rendering.

use std::sync::Arc;
use std::time::Duration;

use copper_otter_core::{CustomerId, ProductCategory, VariantId};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::config::CartSyncConfig;
use crate::error::SyncError;
use crate::item::{Coupon, LineItem, LineMutation};
use crate::mutator::DebouncedMutator;
use crate::notify::{Notice, NoticeSink, NullSink};
use crate::remote::{HttpCartClient, RemoteCartStore};
use crate::snapshot::{FileBackend, SnapshotStore, StorageBackend};
use crate::totals;

/// Interior collections and flags.
///
/// One mutex guards everything so cross-collection operations (move to
/// wishlist, move to cart) stay atomic for synchronous readers. The lock is
/// never held across an await.
#[derive(Debug, Default)]
struct CartState {
    items: Vec<LineItem>,
    wishlist: Vec<LineItem>,
    coupon: Option<Coupon>,
    is_open: bool,
}

/// What `update_quantity` decided under the lock.
enum QuantityOutcome {
    Removed { title: String, category: ProductCategory },
    Updated { category: ProductCategory, quantity: u32 },
}

/// The cart synchronization engine's public handle.
///
/// Constructed once at session start and passed down to whatever needs it;
/// cheaply cloneable via `Arc`. Torn down at session end - dropping the last
/// handle aborts any pending debounced writes.
#[derive(Clone)]
pub struct CartService {
    inner: Arc<CartServiceInner>,
}

struct CartServiceInner {
    state: Mutex<CartState>,
    snapshot: SnapshotStore,
    mutator: DebouncedMutator,
    remote: Arc<dyn RemoteCartStore>,
    identity: watch::Receiver<Option<CustomerId>>,
    sink: Arc<dyn NoticeSink>,
}

impl CartService {
    /// Create the service, hydrating both collections from the snapshot
    /// store.
    #[must_use]
    pub fn new(
        snapshot: SnapshotStore,
        remote: Arc<dyn RemoteCartStore>,
        identity: watch::Receiver<Option<CustomerId>>,
        sink: Arc<dyn NoticeSink>,
        debounce_window: Duration,
    ) -> Self {
        let state = CartState {
            items: snapshot.load_cart(),
            wishlist: snapshot.load_wishlist(),
            coupon: None,
            is_open: false,
        };
        let mutator = DebouncedMutator::new(Arc::clone(&remote), debounce_window);

        Self {
            inner: Arc::new(CartServiceInner {
                state: Mutex::new(state),
                snapshot,
                mutator,
                remote,
                identity,
                sink,
            }),
        }
    }

    /// Build the service from configuration: file-backed snapshots when a
    /// data directory is configured, the HTTP cart client, and no notice
    /// sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot directory cannot be prepared or the
    /// HTTP client fails to build.
    pub fn from_config(
        config: &CartSyncConfig,
        identity: watch::Receiver<Option<CustomerId>>,
    ) -> Result<Self, SyncError> {
        let snapshot = match &config.data_dir {
            Some(dir) => {
                let backend: Arc<dyn StorageBackend> = Arc::new(FileBackend::new(dir.clone())?);
                SnapshotStore::new(backend)
            }
            None => SnapshotStore::in_memory(),
        };
        let remote = Arc::new(HttpCartClient::new(&config.remote)?);

        Ok(Self::new(
            snapshot,
            remote,
            identity,
            Arc::new(NullSink),
            config.debounce_window,
        ))
    }

    // =========================================================================
    // Cart mutations
    // =========================================================================

    /// Add an item to the cart.
    ///
    /// Inserts with quantity 1 if absent, increments if present. Opens the
    /// cart flag. The remote write carries the resulting quantity, computed
    /// from in-memory state here at schedule time.
    pub fn add_item(&self, item: LineItem) {
        let id = item.id;
        let category = item.category;
        let title = item.title.clone();

        let quantity = {
            let mut state = self.inner.state.lock();
            state.is_open = true;

            let quantity = if let Some(existing) = state.items.iter_mut().find(|l| l.id == id) {
                existing.quantity += 1;
                existing.quantity
            } else {
                state.items.push(LineItem { quantity: 1, ..item });
                1
            };
            self.inner.snapshot.save_cart(&state.items);
            quantity
        };

        tracing::debug!(%id, quantity, "Added item to cart");
        self.sync_line(LineMutation {
            id,
            product_type: category,
            quantity,
        });
        self.inner.sink.notify(Notice::ItemAdded { title });
    }

    /// Remove an item from the cart unconditionally; no-op if absent.
    pub fn remove_item(&self, id: VariantId) {
        let removed = {
            let mut state = self.inner.state.lock();
            let found = state
                .items
                .iter()
                .find(|l| l.id == id)
                .map(|l| (l.title.clone(), l.category));
            if found.is_some() {
                state.items.retain(|l| l.id != id);
                self.inner.snapshot.save_cart(&state.items);
            }
            found
        };

        let Some((title, category)) = removed else {
            return;
        };

        tracing::debug!(%id, "Removed item from cart");
        self.sync_line(LineMutation {
            id,
            product_type: category,
            quantity: 0,
        });
        self.inner.sink.notify(Notice::ItemRemoved { title });
    }

    /// Adjust an item's quantity by `delta`; no-op if absent.
    ///
    /// A resulting quantity below 1 removes the item - the collection never
    /// holds a line at quantity 0.
    pub fn update_quantity(&self, id: VariantId, delta: i64) {
        let outcome = {
            let mut state = self.inner.state.lock();
            let Some(index) = state.items.iter().position(|l| l.id == id) else {
                return;
            };
            let Some((current, category, title)) = state
                .items
                .get(index)
                .map(|l| (l.quantity, l.category, l.title.clone()))
            else {
                return;
            };

            let new_quantity = i64::from(current) + delta;
            let outcome = if new_quantity < 1 {
                state.items.remove(index);
                QuantityOutcome::Removed { title, category }
            } else {
                let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
                if let Some(line) = state.items.get_mut(index) {
                    line.quantity = quantity;
                }
                QuantityOutcome::Updated { category, quantity }
            };
            self.inner.snapshot.save_cart(&state.items);
            outcome
        };

        match outcome {
            QuantityOutcome::Removed { title, category } => {
                tracing::debug!(%id, "Quantity dropped below 1, removing item");
                self.sync_line(LineMutation {
                    id,
                    product_type: category,
                    quantity: 0,
                });
                self.inner.sink.notify(Notice::ItemRemoved { title });
            }
            QuantityOutcome::Updated { category, quantity } => {
                tracing::debug!(%id, quantity, "Updated item quantity");
                self.sync_line(LineMutation {
                    id,
                    product_type: category,
                    quantity,
                });
            }
        }
    }

    /// Empty the cart.
    ///
    /// Pending debounced writes are cancelled and, when authenticated, a
    /// remote clear is issued immediately - a terminal, infrequent operation
    /// where immediacy matters more than coalescing, and one that must not
    /// be superseded by a stale per-line write.
    pub fn clear(&self) {
        {
            let mut state = self.inner.state.lock();
            state.items.clear();
            self.inner.snapshot.save_cart(&state.items);
        }
        self.inner.mutator.cancel_all();

        if self.authenticated() {
            let remote = Arc::clone(&self.inner.remote);
            tokio::spawn(async move {
                if let Err(e) = remote.clear().await {
                    tracing::warn!(error = %e, "Remote cart clear failed");
                }
            });
        }

        tracing::debug!("Cleared cart");
        self.inner.sink.notify(Notice::CartCleared);
    }

    /// Apply an already-validated coupon, replacing any existing one.
    ///
    /// Validation happens upstream; no remote call is made here.
    pub fn apply_coupon(&self, coupon: Coupon) {
        let code = coupon.code.clone();
        self.inner.state.lock().coupon = Some(coupon);

        tracing::debug!(code, "Applied coupon");
        self.inner.sink.notify(Notice::CouponApplied { code });
    }

    /// Remove the active coupon, if any.
    pub fn remove_coupon(&self) {
        self.inner.state.lock().coupon = None;
        self.inner.sink.notify(Notice::CouponRemoved);
    }

    // =========================================================================
    // Wishlist mutations
    // =========================================================================

    /// Move an item from the cart to the wishlist.
    ///
    /// Atomic with respect to in-memory state: no reader observes the item
    /// in both collections or neither. The wishlist insert is idempotent.
    pub fn move_to_wishlist(&self, item: LineItem) {
        let id = item.id;
        let category = item.category;
        let title = item.title.clone();

        let was_in_cart = {
            let mut state = self.inner.state.lock();
            if !state.wishlist.iter().any(|l| l.id == id) {
                state.wishlist.push(LineItem { quantity: 1, ..item });
            }
            let before = state.items.len();
            state.items.retain(|l| l.id != id);
            let removed = state.items.len() != before;

            self.inner.snapshot.save_cart(&state.items);
            self.inner.snapshot.save_wishlist(&state.wishlist);
            removed
        };

        if was_in_cart {
            self.sync_line(LineMutation {
                id,
                product_type: category,
                quantity: 0,
            });
        }
        tracing::debug!(%id, "Moved item to wishlist");
        self.inner.sink.notify(Notice::MovedToWishlist { title });
    }

    /// Move an item from the wishlist back into the cart; no-op if absent.
    ///
    /// Cart insertion follows `add_item` semantics (insert at 1 or
    /// increment).
    pub fn move_to_cart(&self, id: VariantId) {
        let moved = {
            let mut state = self.inner.state.lock();
            let Some(index) = state.wishlist.iter().position(|l| l.id == id) else {
                return;
            };
            let item = state.wishlist.remove(index);
            let title = item.title.clone();
            let category = item.category;

            let quantity = if let Some(existing) = state.items.iter_mut().find(|l| l.id == id) {
                existing.quantity += 1;
                existing.quantity
            } else {
                state.items.push(LineItem { quantity: 1, ..item });
                1
            };
            state.is_open = true;

            self.inner.snapshot.save_cart(&state.items);
            self.inner.snapshot.save_wishlist(&state.wishlist);
            (title, category, quantity)
        };

        let (title, category, quantity) = moved;
        tracing::debug!(%id, quantity, "Moved item to cart");
        self.sync_line(LineMutation {
            id,
            product_type: category,
            quantity,
        });
        self.inner.sink.notify(Notice::MovedToCart { title });
    }

    /// Add an item to the wishlist; idempotent if already present.
    pub fn add_to_wishlist(&self, item: LineItem) {
        let mut state = self.inner.state.lock();
        if state.wishlist.iter().any(|l| l.id == item.id) {
            return;
        }
        state.wishlist.push(LineItem { quantity: 1, ..item });
        self.inner.snapshot.save_wishlist(&state.wishlist);
    }

    /// Remove an item from the wishlist; no-op if absent.
    pub fn remove_from_wishlist(&self, id: VariantId) {
        let mut state = self.inner.state.lock();
        let before = state.wishlist.len();
        state.wishlist.retain(|l| l.id != id);
        if state.wishlist.len() != before {
            self.inner.snapshot.save_wishlist(&state.wishlist);
        }
    }

    // =========================================================================
    // Read projections
    // =========================================================================

    /// Toggle the cart-visibility flag.
    pub fn set_open(&self, open: bool) {
        self.inner.state.lock().is_open = open;
    }

    /// Whether the cart panel is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.state.lock().is_open
    }

    /// Current cart lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.inner.state.lock().items.clone()
    }

    /// Current wishlist lines, in insertion order.
    #[must_use]
    pub fn wishlist_items(&self) -> Vec<LineItem> {
        self.inner.state.lock().wishlist.clone()
    }

    /// The active coupon, if any.
    #[must_use]
    pub fn coupon(&self) -> Option<Coupon> {
        self.inner.state.lock().coupon.clone()
    }

    /// Sum of `unit_price x quantity` over all cart lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        totals::subtotal(&self.inner.state.lock().items)
    }

    /// Final total after the active coupon, clamped at zero.
    #[must_use]
    pub fn final_total(&self) -> Decimal {
        let state = self.inner.state.lock();
        totals::total_after_coupon(totals::subtotal(&state.items), state.coupon.as_ref())
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Whether a customer is currently signed in.
    fn authenticated(&self) -> bool {
        self.inner.identity.borrow().is_some()
    }

    /// Forward a mutation to the debounced remote writer when a customer is
    /// signed in. Anonymous carts stay local until merge.
    fn sync_line(&self, mutation: LineMutation) {
        if self.authenticated() {
            self.inner.mutator.schedule(mutation);
        }
    }

    /// Snapshot the local cart lines as merge tuples.
    pub(crate) fn local_lines(&self) -> Vec<LineMutation> {
        self.inner
            .state
            .lock()
            .items
            .iter()
            .map(LineMutation::for_line)
            .collect()
    }

    /// Replace the cart collection with the server's canonical merge result
    /// and persist it.
    pub(crate) fn replace_items(&self, items: Vec<LineItem>) {
        let mut state = self.inner.state.lock();
        state.items = items;
        self.inner.snapshot.save_cart(&state.items);
    }

    /// The remote store handle, shared with the merge coordinator.
    pub(crate) fn remote(&self) -> Arc<dyn RemoteCartStore> {
        Arc::clone(&self.inner.remote)
    }
}

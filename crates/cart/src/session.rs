//! Merge-on-login coordination.
//!
//! When an anonymous browsing session acquires an authenticated identity,
//! the locally accumulated cart and the server-held cart for that identity
//! (items added on another device, say) must be reconciled exactly once.
//! The coordinator watches the identity provider and, on each identity
//! change, sends the local lines to the merge endpoint and replaces the
//! in-memory cart with the canonical result.
//!
//! Merge failures are logged and swallowed: the local cart stays
//! authoritative client-side, and future per-item mutations re-sync
//! implicitly. The user is never blocked on a background merge.

use copper_otter_core::CustomerId;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cart::CartService;

/// Reconciles the local cart with the server cart on identity transitions.
pub struct SessionMergeCoordinator {
    cart: CartService,
    identity: watch::Receiver<Option<CustomerId>>,
}

impl SessionMergeCoordinator {
    /// Create a coordinator over the same identity channel the cart service
    /// watches.
    #[must_use]
    pub const fn new(cart: CartService, identity: watch::Receiver<Option<CustomerId>>) -> Self {
        Self { cart, identity }
    }

    /// Spawn the coordinator's background task.
    ///
    /// Runs for the life of the session; exits when the identity provider
    /// drops its end of the channel. Merge fires on every change to a
    /// present identity - signing in, or switching accounts - never on
    /// re-observation of the identity already merged. A session that starts
    /// out authenticated merges once at startup: the local snapshot may
    /// hold a cart accumulated while signed out.
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut previous: Option<CustomerId> = None;
            loop {
                let current = self.identity.borrow_and_update().clone();
                if current.is_some() && current != previous {
                    if let Some(customer) = &current {
                        self.merge(customer).await;
                    }
                }
                previous = current;

                if self.identity.changed().await.is_err() {
                    // Identity provider is gone; the session is over.
                    break;
                }
            }
        })
    }

    async fn merge(&self, customer: &CustomerId) {
        let local = self.cart.local_lines();
        tracing::info!(%customer, lines = local.len(), "Merging local cart into server cart");

        match self.cart.remote().merge(&local).await {
            Ok(canonical) => {
                tracing::debug!(lines = canonical.len(), "Merge complete, adopting server cart");
                self.cart.replace_items(canonical);
            }
            Err(e) => {
                tracing::warn!(%customer, error = %e, "Cart merge failed; keeping local cart");
            }
        }
    }
}

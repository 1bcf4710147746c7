//! End-to-end cart synchronization scenarios.
//!
//! These drive the public `CartService` surface against the recording mock
//! of the remote store, with the tokio clock paused so debounce windows are
//! deterministic.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use copper_otter_cart::{
    CartService, LineMutation, NullSink, SessionMergeCoordinator, SnapshotStore,
};
use copper_otter_core::{CustomerId, ProductCategory, VariantId};
use copper_otter_integration_tests::{device_line, init_tracing, RecordingCartStore};

const WINDOW: Duration = Duration::from_millis(500);

struct Harness {
    cart: CartService,
    store: Arc<RecordingCartStore>,
    identity: watch::Sender<Option<CustomerId>>,
}

fn harness() -> Harness {
    init_tracing();
    let store = Arc::new(RecordingCartStore::default());
    let (identity, receiver) = watch::channel(None);

    let cart = CartService::new(
        SnapshotStore::in_memory(),
        Arc::clone(&store) as Arc<dyn copper_otter_cart::RemoteCartStore>,
        receiver.clone(),
        Arc::new(NullSink),
        WINDOW,
    );
    // The coordinator task detaches; it exits with the identity sender.
    let _ = SessionMergeCoordinator::new(cart.clone(), receiver).spawn();

    Harness {
        cart,
        store,
        identity,
    }
}

/// Let spawned tasks observe channel updates.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Let every pending debounce window elapse.
async fn drain_debounce() {
    tokio::time::sleep(WINDOW + Duration::from_millis(100)).await;
}

// =============================================================================
// Anonymous Sessions
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_anonymous_mutations_never_reach_the_remote_store() {
    let h = harness();

    h.cart.add_item(device_line(1, 10));
    h.cart.update_quantity(VariantId::new(1), 2);
    h.cart.clear();
    drain_debounce().await;

    assert!(h.store.sets().is_empty());
    assert_eq!(h.store.clears(), 0);
    assert!(h.store.merges().is_empty());
}

// =============================================================================
// Merge On Login
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_login_merges_local_cart_and_adopts_canonical_result() {
    let h = harness();

    h.cart.add_item(device_line(1, 10));
    h.cart.add_item(device_line(1, 10));
    h.cart.add_item(device_line(2, 5));

    // Server already holds item 3 from another device; its merge policy
    // drops local item 2 entirely.
    let mut canonical_one = device_line(1, 10);
    canonical_one.quantity = 2;
    let canonical_three = device_line(3, 20);
    h.store
        .respond_to_merge_with(vec![canonical_one.clone(), canonical_three.clone()]);

    #[allow(clippy::unwrap_used)]
    h.identity.send(Some(CustomerId::new("cus_a"))).unwrap();
    settle().await;

    // The merge request carried the local {id, quantity, category} tuples.
    let merges = h.store.merges();
    assert_eq!(merges.len(), 1);
    assert_eq!(
        merges.first().cloned(),
        Some(vec![
            LineMutation {
                id: VariantId::new(1),
                product_type: ProductCategory::Device,
                quantity: 2,
            },
            LineMutation {
                id: VariantId::new(2),
                product_type: ProductCategory::Device,
                quantity: 1,
            },
        ])
    );

    // Replacement, not union: the canonical collection wins exactly.
    assert_eq!(h.cart.items(), vec![canonical_one, canonical_three]);
}

// =============================================================================
// Authenticated Sync
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_rapid_adds_coalesce_into_one_cumulative_write() {
    let h = harness();
    #[allow(clippy::unwrap_used)]
    h.identity.send(Some(CustomerId::new("cus_a"))).unwrap();
    settle().await;

    // Five rapid "+" clicks inside one quiet window.
    for _ in 0..5 {
        h.cart.add_item(device_line(1, 10));
    }
    drain_debounce().await;

    let sets = h.store.sets();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets.first().map(|m| m.quantity), Some(5));
}

#[tokio::test(start_paused = true)]
async fn test_mutations_on_distinct_lines_sync_independently() {
    let h = harness();
    #[allow(clippy::unwrap_used)]
    h.identity.send(Some(CustomerId::new("cus_a"))).unwrap();
    settle().await;

    h.cart.add_item(device_line(1, 10));
    h.cart.add_item(device_line(2, 5));
    h.cart.add_item(device_line(2, 5));
    drain_debounce().await;

    let mut sets = h.store.sets();
    sets.sort_by_key(|m| m.id);
    assert_eq!(sets.len(), 2);
    assert_eq!(sets.first().map(|m| (m.id, m.quantity)), Some((VariantId::new(1), 1)));
    assert_eq!(sets.get(1).map(|m| (m.id, m.quantity)), Some((VariantId::new(2), 2)));
}

#[tokio::test(start_paused = true)]
async fn test_removal_syncs_quantity_zero() {
    let h = harness();
    #[allow(clippy::unwrap_used)]
    h.identity.send(Some(CustomerId::new("cus_a"))).unwrap();
    settle().await;

    h.cart.add_item(device_line(1, 10));
    drain_debounce().await;

    h.cart.remove_item(VariantId::new(1));
    drain_debounce().await;

    let sets = h.store.sets();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets.get(1).map(|m| m.quantity), Some(0));
}

#[tokio::test(start_paused = true)]
async fn test_decrement_to_zero_coalesces_with_pending_add() {
    let h = harness();
    #[allow(clippy::unwrap_used)]
    h.identity.send(Some(CustomerId::new("cus_a"))).unwrap();
    settle().await;

    // Add then immediately decrement below 1: the remote store should see
    // only the final intent - a single delete write.
    h.cart.add_item(device_line(1, 10));
    h.cart.update_quantity(VariantId::new(1), -1);
    drain_debounce().await;

    let sets = h.store.sets();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets.first().map(|m| m.quantity), Some(0));
    assert!(h.cart.items().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clear_fires_immediately_and_cancels_pending_writes() {
    let h = harness();
    #[allow(clippy::unwrap_used)]
    h.identity.send(Some(CustomerId::new("cus_a"))).unwrap();
    settle().await;

    h.cart.add_item(device_line(1, 10));
    h.cart.add_item(device_line(2, 5));

    // Clear before either debounce window closes.
    h.cart.clear();
    settle().await;
    assert_eq!(h.store.clears(), 1);

    // The stale per-line writes must never land after the clear.
    drain_debounce().await;
    assert!(h.store.sets().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_move_to_wishlist_syncs_cart_removal() {
    let h = harness();
    #[allow(clippy::unwrap_used)]
    h.identity.send(Some(CustomerId::new("cus_a"))).unwrap();
    settle().await;

    let item = device_line(1, 10);
    h.cart.add_item(item.clone());
    drain_debounce().await;

    h.cart.move_to_wishlist(item);
    drain_debounce().await;

    let sets = h.store.sets();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets.get(1).map(|m| m.quantity), Some(0));
    assert_eq!(h.cart.wishlist_items().len(), 1);
    assert!(h.cart.items().is_empty());
}

//! Debounced remote mutator.
//!
//! Coalesces rapid local mutations into a single trailing remote write per
//! line id. Each call to [`DebouncedMutator::schedule`] carries the absolute
//! quantity the line should end up at; scheduling again for the same id
//! before the quiet window elapses cancels the pending timer and restarts
//! the window with the new payload. Distinct ids use fully independent
//! timers.
//!
//! A write that fails is logged and dropped - the next local mutation of
//! that line re-schedules the then-current quantity, which self-heals most
//! transient failures.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use copper_otter_core::VariantId;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::item::LineMutation;
use crate::remote::RemoteCartStore;

/// Per-line trailing debounce over the remote cart store.
///
/// One cancellable timer per line id; `schedule` replaces the pending timer
/// for its id, so the last payload scheduled within the window is the only
/// one sent.
pub struct DebouncedMutator {
    store: Arc<dyn RemoteCartStore>,
    window: Duration,
    timers: Arc<Mutex<HashMap<VariantId, JoinHandle<()>>>>,
}

impl DebouncedMutator {
    /// Create a mutator writing through to `store` after `window` of quiet.
    #[must_use]
    pub fn new(store: Arc<dyn RemoteCartStore>, window: Duration) -> Self {
        Self {
            store,
            window,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Schedule a remote write for one line.
    ///
    /// Cancels any pending timer for the same id and restarts the quiet
    /// window with the new payload. The payload is the absolute quantity
    /// computed from in-memory state at schedule time; `quantity == 0` is
    /// the removal signal.
    pub fn schedule(&self, line: LineMutation) {
        let mut timers = self.timers.lock();
        if let Some(previous) = timers.remove(&line.id) {
            previous.abort();
        }

        let store = Arc::clone(&self.store);
        let window = self.window;
        let timers_ref = Arc::clone(&self.timers);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Past this point the write can no longer be superseded.
            timers_ref.lock().remove(&line.id);

            if let Err(e) = store.set_quantity(line).await {
                tracing::warn!(
                    id = %line.id,
                    quantity = line.quantity,
                    error = %e,
                    "Debounced cart write failed; next mutation will resend"
                );
            }
        });

        timers.insert(line.id, handle);
    }

    /// Abort every pending timer.
    ///
    /// Used by cart clear so a stale per-line write cannot land after the
    /// immediate remote clear. Already-fired writes are not affected.
    pub fn cancel_all(&self) {
        let mut timers = self.timers.lock();
        for (_, handle) in timers.drain() {
            handle.abort();
        }
    }

    /// Number of pending (not yet fired) timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.lock().len()
    }
}

impl Drop for DebouncedMutator {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use async_trait::async_trait;
    use copper_otter_core::ProductCategory;
    use crate::item::LineItem;

    #[derive(Default)]
    struct RecordingStore {
        sets: Mutex<Vec<LineMutation>>,
        fail_sets: Mutex<bool>,
    }

    impl RecordingStore {
        fn sets(&self) -> Vec<LineMutation> {
            self.sets.lock().clone()
        }

        fn fail_next_sets(&self, fail: bool) {
            *self.fail_sets.lock() = fail;
        }
    }

    #[async_trait]
    impl RemoteCartStore for RecordingStore {
        async fn set_quantity(&self, line: LineMutation) -> Result<(), RemoteError> {
            if *self.fail_sets.lock() {
                return Err(RemoteError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            self.sets.lock().push(line);
            Ok(())
        }

        async fn clear(&self) -> Result<(), RemoteError> {
            Ok(())
        }

        async fn merge(&self, _lines: &[LineMutation]) -> Result<Vec<LineItem>, RemoteError> {
            Ok(Vec::new())
        }
    }

    fn mutation(id: i64, quantity: u32) -> LineMutation {
        LineMutation {
            id: VariantId::new(id),
            product_type: ProductCategory::Device,
            quantity,
        }
    }

    const WINDOW: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn test_single_schedule_fires_once_after_window() {
        let store = Arc::new(RecordingStore::default());
        let mutator = DebouncedMutator::new(store.clone(), WINDOW);

        mutator.schedule(mutation(1, 1));
        assert_eq!(mutator.pending(), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.sets(), vec![mutation(1, 1)]);
        assert_eq!(mutator.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_schedules_coalesce_to_last_payload() {
        let store = Arc::new(RecordingStore::default());
        let mutator = DebouncedMutator::new(store.clone(), WINDOW);

        // Five rapid "+" clicks on the same line.
        for quantity in 1..=5 {
            mutator.schedule(mutation(1, quantity));
        }

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.sets(), vec![mutation(1, 5)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_restarts_window() {
        let store = Arc::new(RecordingStore::default());
        let mutator = DebouncedMutator::new(store.clone(), WINDOW);

        mutator.schedule(mutation(1, 1));
        tokio::time::sleep(Duration::from_millis(300)).await;

        // Still inside the window - supersedes and restarts.
        mutator.schedule(mutation(1, 2));
        tokio::time::sleep(Duration::from_millis(300)).await;

        // 600ms since the first schedule, 300ms since the second: nothing yet.
        assert!(store.sets().is_empty());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(store.sets(), vec![mutation(1, 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_ids_use_independent_timers() {
        let store = Arc::new(RecordingStore::default());
        let mutator = DebouncedMutator::new(store.clone(), WINDOW);

        mutator.schedule(mutation(1, 3));
        tokio::time::sleep(Duration::from_millis(300)).await;

        // Scheduling line 2 must not reset line 1's timer.
        mutator.schedule(mutation(2, 1));
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(store.sets(), vec![mutation(1, 3)]);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.sets(), vec![mutation(1, 3), mutation(2, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_is_swallowed_and_next_schedule_resends() {
        let store = Arc::new(RecordingStore::default());
        let mutator = DebouncedMutator::new(store.clone(), WINDOW);

        store.fail_next_sets(true);
        mutator.schedule(mutation(1, 2));
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(store.sets().is_empty());
        assert_eq!(mutator.pending(), 0);

        // Self-heal: the next mutation carries the current quantity.
        store.fail_next_sets(false);
        mutator.schedule(mutation(1, 3));
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(store.sets(), vec![mutation(1, 3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_drops_pending_writes() {
        let store = Arc::new(RecordingStore::default());
        let mutator = DebouncedMutator::new(store.clone(), WINDOW);

        mutator.schedule(mutation(1, 1));
        mutator.schedule(mutation(2, 1));
        assert_eq!(mutator.pending(), 2);

        mutator.cancel_all();
        assert_eq!(mutator.pending(), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(store.sets().is_empty());
    }
}

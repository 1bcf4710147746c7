//! Shared fixtures for Copper Otter integration tests.
//!
//! Provides a recording mock of the remote cart store and line-item
//! builders so the test files can focus on scenario logic.

#![cfg_attr(not(test), forbid(unsafe_code))]

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use url::Url;

use copper_otter_cart::{LineItem, LineMutation, RemoteCartStore, RemoteError};
use copper_otter_core::{CurrencyCode, Price, ProductCategory, VariantId};

/// Recording mock of the remote cart store.
///
/// Captures every call and lets tests configure the merge response and
/// inject failures per operation.
#[derive(Default)]
pub struct RecordingCartStore {
    inner: Mutex<RecordingInner>,
}

#[derive(Default)]
struct RecordingInner {
    sets: Vec<LineMutation>,
    clears: usize,
    merges: Vec<Vec<LineMutation>>,
    merge_response: Vec<LineItem>,
    fail_sets: bool,
    fail_merge: bool,
}

impl RecordingCartStore {
    /// All per-line writes received so far, in arrival order.
    pub fn sets(&self) -> Vec<LineMutation> {
        self.inner.lock().sets.clone()
    }

    /// Number of clear-all calls received.
    pub fn clears(&self) -> usize {
        self.inner.lock().clears
    }

    /// All merge batches received so far.
    pub fn merges(&self) -> Vec<Vec<LineMutation>> {
        self.inner.lock().merges.clone()
    }

    /// Set the canonical collection the next merges will return.
    pub fn respond_to_merge_with(&self, lines: Vec<LineItem>) {
        self.inner.lock().merge_response = lines;
    }

    /// Make subsequent per-line writes fail with a 500.
    pub fn fail_sets(&self, fail: bool) {
        self.inner.lock().fail_sets = fail;
    }

    /// Make subsequent merges fail with a 503.
    pub fn fail_merge(&self, fail: bool) {
        self.inner.lock().fail_merge = fail;
    }
}

#[async_trait]
impl RemoteCartStore for RecordingCartStore {
    async fn set_quantity(&self, line: LineMutation) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        if inner.fail_sets {
            return Err(RemoteError::Api {
                status: 500,
                message: "write rejected".to_string(),
            });
        }
        inner.sets.push(line);
        Ok(())
    }

    async fn clear(&self) -> Result<(), RemoteError> {
        self.inner.lock().clears += 1;
        Ok(())
    }

    async fn merge(&self, lines: &[LineMutation]) -> Result<Vec<LineItem>, RemoteError> {
        let mut inner = self.inner.lock();
        if inner.fail_merge {
            return Err(RemoteError::Api {
                status: 503,
                message: "merge unavailable".to_string(),
            });
        }
        inner.merges.push(lines.to_vec());
        Ok(inner.merge_response.clone())
    }
}

/// Build a device line item with the given id and whole-dollar unit price.
///
/// # Panics
///
/// Never - the image URL is a valid constant.
#[must_use]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
pub fn device_line(id: i64, dollars: i64) -> LineItem {
    LineItem {
        id: VariantId::new(id),
        title: format!("Device {id}"),
        subtitle: "Renewed".to_string(),
        unit_price: Price::new(Decimal::from(dollars), CurrencyCode::USD),
        image: Url::parse("https://cdn.copperotter.dev/placeholder.webp").unwrap(),
        category: ProductCategory::Device,
        quantity: 1,
    }
}

/// Initialize test logging once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "copper_otter_cart=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

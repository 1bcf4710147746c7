//! Copper Otter Cart - client-side cart synchronization engine.
//!
//! The storefront UI holds its cart in memory and renders from it directly;
//! this crate keeps that in-memory state durable across reloads, merged
//! across the anonymous-to-authenticated transition, and eventually
//! consistent with the remote cart store - without the UI ever blocking on
//! network latency.
//!
//! # Architecture
//!
//! - [`CartService`] - the authoritative in-memory aggregate (cart,
//!   wishlist, coupon) and every mutation operation
//! - [`snapshot::SnapshotStore`] - synchronous best-effort persistence of
//!   both collections to host-provided key-value storage
//! - [`mutator::DebouncedMutator`] - coalesces rapid mutations into one
//!   trailing remote write per line id (last user intent wins)
//! - [`SessionMergeCoordinator`] - one-shot reconciliation with the server
//!   cart when a customer signs in
//! - [`totals`] - pure subtotal/final-total derivation
//!
//! Local state is always the source of truth for rendering: mutations apply
//! synchronously and persistence/synchronization happen behind them,
//! best-effort. Background failures are logged and swallowed, never thrown
//! to the UI.
//!
//! # Example
//!
//! ```rust,ignore
//! use copper_otter_cart::{CartService, CartSyncConfig, SessionMergeCoordinator};
//! use tokio::sync::watch;
//!
//! let config = CartSyncConfig::from_env()?;
//! let (identity_tx, identity_rx) = watch::channel(None);
//!
//! let cart = CartService::from_config(&config, identity_rx.clone())?;
//! SessionMergeCoordinator::new(cart.clone(), identity_rx).spawn();
//!
//! cart.add_item(pixel_9_line());
//! assert_eq!(cart.items().len(), 1);
//!
//! // Later, when the customer signs in, the coordinator merges the local
//! // cart with whatever the server already holds for them:
//! identity_tx.send(Some(customer_id))?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod item;
pub mod mutator;
pub mod notify;
pub mod remote;
pub mod session;
pub mod snapshot;
pub mod totals;

pub use cart::CartService;
pub use config::{CartSyncConfig, ConfigError, RemoteStoreConfig, DEFAULT_DEBOUNCE_MS};
pub use error::SyncError;
pub use item::{Coupon, LineItem, LineMutation};
pub use notify::{Notice, NoticeSink, NullSink};
pub use remote::{HttpCartClient, RemoteCartStore, RemoteError};
pub use session::SessionMergeCoordinator;
pub use snapshot::{FileBackend, MemoryBackend, SnapshotStore, StorageBackend, StorageError};

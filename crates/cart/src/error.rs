//! Unified error surface for engine construction.
//!
//! Running mutations never return errors - background synchronization
//! failures are logged and swallowed so the in-memory aggregate stays
//! authoritative for the UI. The only fallible moment is wiring the engine
//! up, and `SyncError` is the single type embedders handle there.

use thiserror::Error;

use crate::config::ConfigError;
use crate::remote::RemoteError;
use crate::snapshot::StorageError;

/// Error building the cart engine from configuration.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local storage backend could not be prepared.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Remote cart client could not be built.
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Configuration was missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for `SyncError`.
pub type Result<T> = std::result::Result<T, SyncError>;

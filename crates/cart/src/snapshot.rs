//! Durable local persistence of the cart and wishlist collections.
//!
//! The snapshot store writes through to whatever key-value mechanism the
//! host environment offers, namespacing the cart and wishlist under separate
//! keys. Persistence is synchronous, unconditional, and best-effort: a
//! corrupt or unavailable backend never raises to the mutation path, it only
//! logs and falls back to an empty collection.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::item::LineItem;

/// Storage key for the cart collection.
const CART_KEY: &str = "cart.items";
/// Storage key for the wishlist collection.
const WISHLIST_KEY: &str = "wishlist.items";

/// Errors raised by storage backends.
///
/// These stop at the snapshot store boundary - callers of `load`/`save`
/// never see them.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw key-value persistence the host environment provides.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory backend.
///
/// Used in tests and by hosts that manage durability themselves.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One-file-per-key backend under a data directory.
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create the backend, creating `dir` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// Best-effort durable store for the cart and wishlist collections.
///
/// Collections are persisted as JSON-serialized arrays of [`LineItem`].
#[derive(Clone)]
pub struct SnapshotStore {
    backend: Arc<dyn StorageBackend>,
}

impl SnapshotStore {
    /// Create a snapshot store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Create a snapshot store over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Load the persisted cart collection, or empty if absent or corrupt.
    #[must_use]
    pub fn load_cart(&self) -> Vec<LineItem> {
        self.load(CART_KEY)
    }

    /// Load the persisted wishlist collection, or empty if absent or corrupt.
    #[must_use]
    pub fn load_wishlist(&self) -> Vec<LineItem> {
        self.load(WISHLIST_KEY)
    }

    /// Overwrite the persisted cart collection.
    pub fn save_cart(&self, items: &[LineItem]) {
        self.save(CART_KEY, items);
    }

    /// Overwrite the persisted wishlist collection.
    pub fn save_wishlist(&self, items: &[LineItem]) {
        self.save(WISHLIST_KEY, items);
    }

    fn load(&self, key: &str) -> Vec<LineItem> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read snapshot, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(key, error = %e, "Corrupt snapshot, starting empty");
                Vec::new()
            }
        }
    }

    fn save(&self, key: &str, items: &[LineItem]) {
        let raw = match serde_json::to_string(items) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to serialize snapshot");
                return;
            }
        };

        if let Err(e) = self.backend.set(key, &raw) {
            tracing::warn!(key, error = %e, "Failed to persist snapshot");
        }
    }
}

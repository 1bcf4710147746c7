//! Cart engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COPPER_OTTER_CART_API_URL` - Base URL of the remote cart store
//! - `COPPER_OTTER_CART_API_TOKEN` - Bearer token for the remote cart store
//!
//! ## Optional
//! - `COPPER_OTTER_CART_API_VERSION` - API version header (default: 2025-07)
//! - `COPPER_OTTER_DEBOUNCE_MS` - Quiet window for remote writes (default: 500)
//! - `COPPER_OTTER_DATA_DIR` - Directory for durable snapshots; in-memory
//!   storage is used when unset

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default quiet window for the debounced remote mutator, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

const DEFAULT_API_VERSION: &str = "2025-07";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart synchronization engine configuration.
#[derive(Debug, Clone)]
pub struct CartSyncConfig {
    /// Remote cart store connection settings.
    pub remote: RemoteStoreConfig,
    /// Quiet window for coalescing remote writes per line.
    pub debounce_window: Duration,
    /// Directory for durable snapshots; `None` keeps snapshots in memory.
    pub data_dir: Option<PathBuf>,
}

/// Remote cart store connection settings.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct RemoteStoreConfig {
    /// Base URL of the remote cart store.
    pub base_url: Url,
    /// API version sent with every request.
    pub api_version: String,
    /// Bearer token authenticating this client.
    pub api_token: SecretString,
}

impl std::fmt::Debug for RemoteStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStoreConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.api_version)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl CartSyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let remote = RemoteStoreConfig::from_env()?;
        let debounce_window = get_env_or_default(
            "COPPER_OTTER_DEBOUNCE_MS",
            &DEFAULT_DEBOUNCE_MS.to_string(),
        )
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| {
            ConfigError::InvalidEnvVar("COPPER_OTTER_DEBOUNCE_MS".to_string(), e.to_string())
        })?;
        let data_dir = get_optional_env("COPPER_OTTER_DATA_DIR").map(PathBuf::from);

        Ok(Self {
            remote,
            debounce_window,
            data_dir,
        })
    }

    /// Build a configuration programmatically (embedding hosts, tests).
    #[must_use]
    pub fn new(remote: RemoteStoreConfig) -> Self {
        Self {
            remote,
            debounce_window: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            data_dir: None,
        }
    }
}

impl RemoteStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("COPPER_OTTER_CART_API_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("COPPER_OTTER_CART_API_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            base_url,
            api_version: get_env_or_default("COPPER_OTTER_CART_API_VERSION", DEFAULT_API_VERSION),
            api_token: SecretString::from(get_required_env("COPPER_OTTER_CART_API_TOKEN")?),
        })
    }

    /// Build remote settings programmatically.
    #[must_use]
    pub fn new(base_url: Url, api_token: SecretString) -> Self {
        Self {
            base_url,
            api_version: DEFAULT_API_VERSION.to_string(),
            api_token,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn remote_config() -> RemoteStoreConfig {
        RemoteStoreConfig::new(
            Url::parse("https://api.copperotter.dev").unwrap(),
            SecretString::from("tok_5Kx9mQ2pLw"),
        )
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug_output = format!("{:?}", remote_config());
        assert!(debug_output.contains("api.copperotter.dev"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok_5Kx9mQ2pLw"));
    }

    #[test]
    fn test_programmatic_defaults() {
        let config = CartSyncConfig::new(remote_config());
        assert_eq!(
            config.debounce_window,
            Duration::from_millis(DEFAULT_DEBOUNCE_MS)
        );
        assert!(config.data_dir.is_none());
        assert_eq!(config.remote.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn test_get_env_or_default_falls_back() {
        assert_eq!(
            get_env_or_default("COPPER_OTTER_TEST_UNSET_VAR", "fallback"),
            "fallback"
        );
    }

    #[test]
    fn test_missing_required_env_is_error() {
        let result = get_required_env("COPPER_OTTER_TEST_UNSET_VAR");
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }
}

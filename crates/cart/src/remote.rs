//! Remote cart store client.
//!
//! The remote store holds the server-side copy of an authenticated
//! customer's cart. It accepts per-line absolute-quantity writes (quantity
//! 0 = delete), a clear-all, and a merge endpoint that folds a batch of
//! locally accumulated lines into the server cart and returns the canonical
//! result.
//!
//! [`RemoteCartStore`] is the seam the rest of the engine depends on;
//! [`HttpCartClient`] is the production implementation. Tests substitute a
//! recording mock.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::RemoteStoreConfig;
use crate::item::{LineItem, LineMutation};

/// Errors that can occur when talking to the remote cart store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response or build the client.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Server-side cart operations the engine depends on.
#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    /// Set the absolute quantity for one line; 0 deletes the line.
    async fn set_quantity(&self, line: LineMutation) -> Result<(), RemoteError>;

    /// Delete every line in the customer's server-side cart.
    async fn clear(&self) -> Result<(), RemoteError>;

    /// Merge locally accumulated lines into the server-held cart.
    ///
    /// The server performs the authoritative merge (summing or max-ing
    /// quantities per its own policy) and returns the canonical resulting
    /// collection.
    async fn merge(&self, lines: &[LineMutation]) -> Result<Vec<LineItem>, RemoteError>;
}

/// HTTP client for the Copper Otter cart API.
#[derive(Clone)]
pub struct HttpCartClient {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    lines: Vec<LineItem>,
}

impl HttpCartClient {
    /// Create a new cart API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &RemoteStoreConfig) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| RemoteError::Parse(format!("Invalid API token format: {e}")))?,
        );

        headers.insert(
            "Copper-Otter-Api-Version",
            HeaderValue::from_str(&config.api_version)
                .map_err(|e| RemoteError::Parse(format!("Invalid API version: {e}")))?,
        );

        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

/// Map a non-success response to `RemoteError::Api`.
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RemoteCartStore for HttpCartClient {
    async fn set_quantity(&self, line: LineMutation) -> Result<(), RemoteError> {
        let url = self.url(&format!("/cart/lines/{}", line.id));
        tracing::debug!(id = %line.id, quantity = line.quantity, "PUT cart line");

        let response = self.client.put(&url).json(&line).send().await?;
        error_for_status(response).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), RemoteError> {
        let url = self.url("/cart");
        tracing::debug!("DELETE cart");

        let response = self.client.delete(&url).send().await?;
        error_for_status(response).await?;
        Ok(())
    }

    async fn merge(&self, lines: &[LineMutation]) -> Result<Vec<LineItem>, RemoteError> {
        let url = self.url("/cart/merge");
        let body = serde_json::json!({ "lines": lines });

        let response = self.client.post(&url).json(&body).send().await?;
        let response = error_for_status(response).await?;

        let merged: MergeResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;
        Ok(merged.lines)
    }
}

//! Asynchronous tile payload fetching.
//!
//! The transport is abstracted behind [`TileFetcher`] so layers can be
//! driven by HTTP in production and by in-memory fetchers in tests.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use super::FetchError;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default request timeout for [`HttpTileFetcher`].
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Fetches tile payloads by source key.
///
/// The returned future owns everything it needs (`'static`), so many fetches
/// can be in flight while the layer keeps mutating its own state between
/// completions. Dropping the future cancels the fetch.
pub trait TileFetcher: Send + Sync {
    /// Fetch the payload for `source_key`.
    fn fetch(&self, source_key: String) -> BoxFuture<'static, Result<Bytes, FetchError>>;
}

/// HTTP fetcher backed by an async `reqwest` client.
///
/// The client is cheap to clone, so each fetch future carries its own handle.
#[derive(Debug, Clone)]
pub struct HttpTileFetcher {
    client: reqwest::Client,
}

impl HttpTileFetcher {
    /// Creates a fetcher with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    /// Creates a fetcher with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl TileFetcher for HttpTileFetcher {
    fn fetch(&self, source_key: String) -> BoxFuture<'static, Result<Bytes, FetchError>> {
        let client = self.client.clone();
        Box::pin(async move {
            debug!(url = %source_key, "Fetching tile");
            let response = client
                .get(&source_key)
                .send()
                .await
                .map_err(|e| FetchError::Http(format!("Request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    source_key,
                });
            }

            response
                .bytes()
                .await
                .map_err(|e| FetchError::Http(format!("Failed to read response: {}", e)))
        })
    }
}

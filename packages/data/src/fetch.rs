//! HTTP file fetcher with retry for transient errors.
//!
//! The bundled database lives alongside the other static assets, so a fetch
//! failure is almost always transient (cold CDN edge, flaky connection).
//! Connection errors, timeouts, HTTP 429, and 5xx are retried with
//! exponential backoff; other 4xx statuses are permanent and fail
//! immediately.

use std::time::Duration;

use async_trait::async_trait;

use crate::{DataError, FileFetcher};

/// Maximum number of retry attempts for transient HTTP errors.
///
/// With exponential backoff (2s, 4s, 8s) the total wait before giving up
/// is 14 seconds.
const MAX_RETRIES: u32 = 3;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`FileFetcher`] backed by a [`reqwest::Client`].
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    async fn send_with_retry(&self, url: &str) -> Result<reqwest::Response, DataError> {
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_secs(1u64 << attempt); // 2s, 4s, 8s
                log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
                tokio::time::sleep(delay).await;
            }

            match self.client.get(url).send().await {
                Err(e) => {
                    if is_transient(&e) && attempt < MAX_RETRIES {
                        log::warn!("  transient error fetching {url}: {e}");
                        continue;
                    }
                    return Err(DataError::Http(e));
                }
                Ok(response) => {
                    let status = response.status();
                    let retryable = status == reqwest::StatusCode::TOO_MANY_REQUESTS
                        || status.is_server_error();
                    if retryable && attempt < MAX_RETRIES {
                        log::warn!("  HTTP {status} fetching {url}");
                        continue;
                    }
                    return response.error_for_status().map_err(DataError::Http);
                }
            }
        }

        unreachable!("send_with_retry loop exited without returning")
    }
}

#[async_trait]
impl FileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DataError> {
        let response = self.send_with_retry(url).await?;
        let bytes = response.bytes().await?;
        log::debug!("Fetched {} bytes from {url}", bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}

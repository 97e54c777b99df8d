//! Shared HTTP client utilities

use crate::{EgressError, Result};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum number of idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Maximum number of retries for transient errors
    pub max_retries: u32,

    /// Base delay of the exponential backoff in milliseconds
    pub retry_base_delay_ms: u64,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            // Summaries of long documents can take minutes
            timeout_secs: 300,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 8,
            max_retries: 3,
            retry_base_delay_ms: 100,
            user_agent: format!("Cloak/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a configured HTTP client with connection pooling
pub fn create_client(config: &HttpClientConfig) -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        // Expire idle connections before the upstream closes them
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(&config.user_agent)
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|e| EgressError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

/// Whether a failed attempt is worth repeating
pub fn is_retryable(error: &EgressError) -> bool {
    match error {
        EgressError::HttpError(req_err) => {
            req_err.is_connect() || req_err.is_timeout() || req_err.is_request()
        }
        EgressError::ProviderError { status_code, .. } => {
            matches!(status_code, 429 | 500 | 502 | 503 | 504 | 529)
        }
        EgressError::Timeout(_) | EgressError::RateLimitExceeded { .. } => true,
        EgressError::ConfigError(_) | EgressError::ParseError(_) => false,
    }
}

/// Retry an operation on transient errors with exponential backoff.
///
/// A rate-limit error carrying a retry-after hint waits that long instead.
pub async fn with_retry<F, Fut, T>(config: &HttpClientConfig, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let max_retries = config.max_retries;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries && is_retryable(&e) => {
                attempt += 1;

                let delay = match &e {
                    EgressError::RateLimitExceeded {
                        retry_after_secs: Some(secs),
                    } => Duration::from_secs(*secs),
                    _ => Duration::from_millis(config.retry_base_delay_ms * 2u64.pow(attempt - 1)),
                };

                warn!(
                    "Request failed (attempt {}/{}): {}",
                    attempt,
                    max_retries + 1,
                    e
                );
                debug!("Retrying request after {}ms", delay.as_millis());
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

//! Cloak Egress Connectors
//!
//! Text generation backed by downstream LLM providers:
//! - Anthropic Messages API (plain and structured output)

pub mod anthropic;
pub mod client;
pub mod retry_after;

pub use anthropic::{AnthropicConfig, AnthropicConnector};
pub use client::HttpClientConfig;
pub use retry_after::parse_retry_after;

use thiserror::Error;

/// Errors raised while talking to a provider
#[derive(Debug, Error)]
pub enum EgressError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Provider returned status {status_code}: {message}")]
    ProviderError { status_code: u16, message: String },

    #[error("Request timeout after {0}s")]
    Timeout(u64),

    #[error("{}", rate_limit_message(.retry_after_secs))]
    RateLimitExceeded { retry_after_secs: Option<u64> },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

fn rate_limit_message(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!("Rate limit exceeded, retry after {}s", secs),
        None => "Rate limit exceeded".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, EgressError>;

impl From<EgressError> for cloak_core::Error {
    fn from(err: EgressError) -> Self {
        match err {
            EgressError::ConfigError(msg) => cloak_core::Error::Config(msg),
            other => cloak_core::Error::Provider(other.to_string()),
        }
    }
}

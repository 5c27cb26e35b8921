//! Shared HTTP utilities for LLM providers
//!
//! Client setup, retry logic and error mapping shared by every provider.

use crate::config::HttpConfig;
use crate::llm::LlmError;
use crate::utils::text::truncate;
use reqwest::Client;
use std::time::Duration;

pub mod headers;
pub mod retry;

pub use headers::{CommonHeaders, HeaderBuilder, OpenRouterHeaders};
pub use retry::{execute_with_retry, RetryConfig};

/// Default timeout for HTTP requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of retry attempts
pub const DEFAULT_RETRY_ATTEMPTS: usize = 2;

/// Default delay between retries
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Longest slice of an error body kept in [`LlmError::RequestFailed`]
pub const ERROR_BODY_PREFIX: usize = 200;

/// User agent sent with every provider request
pub const USER_AGENT: &str = concat!("codepad/", env!("CARGO_PKG_VERSION"));

/// Common HTTP client configuration used across providers
#[derive(Debug, Clone)]
pub struct SharedHttpConfig {
    pub timeout: Duration,
    pub retry_attempts: usize,
    pub retry_delay: Duration,
    pub user_agent: Option<String>,
}

impl Default for SharedHttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            user_agent: Some(USER_AGENT.to_string()),
        }
    }
}

impl From<&HttpConfig> for SharedHttpConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            timeout: config.timeout(),
            retry_attempts: config.retry_attempts,
            ..Self::default()
        }
    }
}

impl SharedHttpConfig {
    /// Retry settings derived from this configuration
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_attempts,
            base_delay: self.retry_delay,
            max_delay: self.retry_delay * 10,
            exponential_backoff: true,
        }
    }

    /// Longest a retried request can take: every attempt timing out plus
    /// every backoff sleep between them
    pub fn call_budget(&self) -> Duration {
        self.timeout * (self.retry_attempts as u32 + 1) + self.retry_config().total_backoff()
    }
}

/// Create a configured reqwest client with standard settings
pub fn create_client(config: &SharedHttpConfig) -> Result<Client, LlmError> {
    let mut builder = Client::builder().timeout(config.timeout);

    if let Some(ref user_agent) = config.user_agent {
        builder = builder.user_agent(user_agent);
    }

    builder.build().map_err(LlmError::Network)
}

/// Map a transport failure, separating timeouts from other network errors
pub fn map_transport_error(error: reqwest::Error, timeout: Duration) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        LlmError::Network(error)
    }
}

/// Turn a non-success response into an error carrying a prefix of its body
pub fn parse_http_error(status: u16, body: &str) -> LlmError {
    LlmError::RequestFailed {
        status,
        message: truncate(body.trim(), ERROR_BODY_PREFIX),
    }
}

/// Read the body of a non-success response and convert it
pub async fn error_from_response(response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    parse_http_error(status, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_error_truncates_body() {
        let body = "x".repeat(1000);
        match parse_http_error(503, &body) {
            LlmError::RequestFailed { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message.chars().count(), ERROR_BODY_PREFIX);
                assert!(message.ends_with("..."));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shared_config_from_http_config() {
        let http = HttpConfig {
            timeout_secs: 7,
            retry_attempts: 0,
        };
        let shared = SharedHttpConfig::from(&http);
        assert_eq!(shared.timeout, Duration::from_secs(7));
        assert_eq!(shared.retry_config().max_attempts, 0);
        assert!(shared.user_agent.unwrap().starts_with("codepad/"));
    }

    #[test]
    fn test_call_budget_covers_attempts_and_backoff() {
        let shared = SharedHttpConfig::default();
        // three 60s attempts, then 1s and 2s of backoff
        assert_eq!(shared.call_budget(), Duration::from_secs(183));

        let single = SharedHttpConfig {
            retry_attempts: 0,
            ..SharedHttpConfig::default()
        };
        assert_eq!(single.call_budget(), DEFAULT_TIMEOUT);
    }
}

//! Retry logic for HTTP operations

use crate::llm::LlmError;
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_backoff: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            exponential_backoff: true,
        }
    }
}

impl RetryConfig {
    /// Sum of every backoff sleep when all retries are used
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts)
            .map(|attempt| calculate_delay(attempt, self))
            .sum()
    }
}

/// Execute an operation, retrying transient failures.
///
/// `max_attempts` counts retries, so the operation runs at most
/// `max_attempts + 1` times.
pub async fn execute_with_retry<F, Fut, T>(operation: F, config: &RetryConfig) -> Result<T, LlmError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, LlmError>> + Send,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) if attempt < config.max_attempts && error.is_transient() => {
                let delay = calculate_delay(attempt, config);
                tracing::debug!(
                    "Transient provider error ({}), retry {}/{} in {:?}",
                    error.kind(),
                    attempt + 1,
                    config.max_attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Calculate delay for retry attempt
fn calculate_delay(attempt: usize, config: &RetryConfig) -> Duration {
    if !config.exponential_backoff {
        return config.base_delay;
    }
    let exponential_delay = config.base_delay * 2_u32.saturating_pow(attempt as u32);
    std::cmp::min(exponential_delay, config.max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast_config(max_attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            exponential_backoff: false,
        }
    }

    #[tokio::test]
    async fn test_retry_success_after_failure() {
        let attempt_count = Arc::new(AtomicUsize::new(0));
        let attempt_count_clone = attempt_count.clone();

        let operation = move || {
            let count = attempt_count_clone.clone();
            async move {
                let current = count.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    Err(LlmError::RequestFailed {
                        status: 500,
                        message: "test server error".to_string(),
                    })
                } else {
                    Ok("success".to_string())
                }
            }
        };

        let result = execute_with_retry(operation, &fast_config(3)).await;
        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let attempt_count = Arc::new(AtomicUsize::new(0));
        let attempt_count_clone = attempt_count.clone();

        let operation = move || {
            let count = attempt_count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(LlmError::RequestFailed {
                    status: 503,
                    message: "unavailable".to_string(),
                })
            }
        };

        let result = execute_with_retry(operation, &fast_config(2)).await;
        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let attempt_count = Arc::new(AtomicUsize::new(0));
        let attempt_count_clone = attempt_count.clone();

        let operation = move || {
            let count = attempt_count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(LlmError::RequestFailed {
                    status: 401,
                    message: "invalid key".to_string(),
                })
            }
        };

        let result = execute_with_retry(operation, &fast_config(3)).await;
        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let config = RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            exponential_backoff: true,
        };
        assert_eq!(calculate_delay(0, &config), Duration::from_millis(100));
        assert_eq!(calculate_delay(2, &config), Duration::from_millis(400));
        assert_eq!(calculate_delay(5, &config), Duration::from_millis(500));
    }

    #[test]
    fn test_total_backoff_sums_every_sleep() {
        let config = RetryConfig {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            exponential_backoff: true,
        };
        // 100 + 200 + 400 + 500 (capped)
        assert_eq!(config.total_backoff(), Duration::from_millis(1200));
        assert_eq!(fast_config(0).total_backoff(), Duration::ZERO);
    }
}

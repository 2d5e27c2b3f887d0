use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use super::error::CompletionApiError;

use crate::domain::models::config::RetryConfig;

/// Retry policy with exponential backoff for completion API requests
///
/// Transient errors (rate limit, server errors, network failures) are
/// retried with doubling backoff capped at `max_backoff_ms`; permanent
/// errors (bad request, bad key) fail immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Initial backoff duration in milliseconds
    initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds
    max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub const fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// Create a retry policy from the loaded configuration
    pub const fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            config.initial_backoff_ms,
            config.max_backoff_ms,
        )
    }

    /// Execute an operation with exponential backoff retry logic
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted, or immediately
    /// for permanent errors.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, CompletionApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CompletionApiError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "operation succeeded after retries");
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if self.should_retry(&err, attempt) {
                        let backoff = self.calculate_backoff(attempt);
                        warn!(
                            attempt = attempt + 1,
                            ?backoff,
                            error = %err,
                            "transient completion error, retrying"
                        );
                        sleep(backoff).await;
                        attempt += 1;
                    } else {
                        if attempt >= self.max_retries {
                            warn!(attempts = attempt + 1, error = %err, "retries exhausted");
                        } else {
                            debug!(error = %err, "permanent error, not retrying");
                        }
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Exponential backoff: min(initial * 2^attempt, max)
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    fn should_retry(&self, error: &CompletionApiError, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }

        error.is_transient()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

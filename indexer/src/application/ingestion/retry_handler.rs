//! Retry handler for re-running atomic units that lost a write race

use std::future::Future;
use tokio::time::{sleep, Duration};

use crate::utils::logging;

/// Re-runs an operation while its error is classified as retryable
#[derive(Debug, Clone)]
pub struct RetryHandler {
    max_retries: u32,
    base_delay_ms: u64,
}

impl RetryHandler {
    pub fn new() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 20,
        }
    }

    pub fn with_config(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }

    /// Execute an operation, retrying errors accepted by `is_retryable` with
    /// exponential backoff. Other errors are returned immediately.
    pub async fn execute_with_retry<F, Fut, T, E, P>(
        &self,
        operation: F,
        operation_name: &str,
        is_retryable: P,
    ) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let mut retry_count = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if retry_count > 0 {
                        logging::log_info(&format!(
                            "{} succeeded after {} retries",
                            operation_name, retry_count
                        ));
                    }
                    return Ok(result);
                }
                Err(e) if !is_retryable(&e) => return Err(e),
                Err(e) => {
                    retry_count += 1;

                    if retry_count >= self.max_retries {
                        logging::log_error(&format!(
                            "{} failed after {} attempts: {}",
                            operation_name, self.max_retries, e
                        ));
                        return Err(e);
                    }

                    let delay = self.calculate_delay(retry_count);
                    logging::log_warning(&format!(
                        "{} failed (attempt {}/{}): {}. Retrying in {}ms",
                        operation_name, retry_count, self.max_retries, e, delay
                    ));

                    sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }

    /// Calculate exponential backoff delay
    fn calculate_delay(&self, retry_count: u32) -> u64 {
        self.base_delay_ms * (2_u64.pow(retry_count.saturating_sub(1)))
    }
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::new()
    }
}

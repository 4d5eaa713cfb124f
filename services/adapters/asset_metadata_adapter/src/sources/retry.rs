//! Timeout and bounded retry for remote calls

use metadata_config::service::remote;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::error::QueryError;

/// Doubling stops after 2^6 = 64x the base delay
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Per-attempt timeout with exponential backoff between attempts
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,

    /// Timeout applied to each attempt
    pub timeout: Duration,

    /// First backoff delay, doubled after every failed attempt
    pub backoff_base: Duration,

    /// Ceiling for any single backoff delay
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, timeout: Duration, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            timeout,
            backoff_base,
            max_backoff: Duration::from_millis(remote::RETRY_BACKOFF_MAX_MS),
        }
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Delay before the next attempt after `failed_attempts` failures
    pub fn backoff_for(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.backoff_base
            .checked_mul(2_u32.pow(exponent))
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails permanently or attempts run out
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, QueryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, QueryError>>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let result = match timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(QueryError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempts < self.max_attempts => {
                    warn!(
                        "{} failed (attempt {}/{}): {}",
                        label, attempts, self.max_attempts, e
                    );

                    sleep(self.backoff_for(attempts)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            remote::MAX_RETRIES,
            Duration::from_millis(remote::REQUEST_TIMEOUT_MS),
            Duration::from_millis(remote::RETRY_BACKOFF_BASE_MS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(50), Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retries_transport_errors() {
        let calls = AtomicU32::new(0);
        let result = quick_policy(3)
            .run("flaky", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(QueryError::Transport("connection reset".into()))
                } else {
                    Ok(18u8)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 18);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = quick_policy(2)
            .run("down", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(QueryError::Transport("refused".into()))
            })
            .await;

        assert!(matches!(result, Err(QueryError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = quick_policy(5)
            .run("malformed", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(QueryError::Malformed("missing field".into()))
            })
            .await;

        assert!(matches!(result, Err(QueryError::Malformed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_many_attempts_do_not_overflow_backoff() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::new(40, Duration::from_millis(10), Duration::ZERO)
            .run("always down", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(QueryError::Transport("refused".into()))
            })
            .await;

        assert!(matches!(result, Err(QueryError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 40);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1), Duration::from_millis(500))
            .with_max_backoff(Duration::from_secs(10));

        assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff_for(5), Duration::from_millis(8000));
        assert_eq!(policy.backoff_for(6), Duration::from_secs(10));
        assert_eq!(policy.backoff_for(99), Duration::from_secs(10));

        // Huge base still lands on the ceiling
        let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::MAX)
            .with_max_backoff(Duration::from_secs(10));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_hung_call_times_out() {
        let result: Result<(), _> = quick_policy(1)
            .run("hung", || async {
                sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(QueryError::Timeout { timeout_ms: 50 })));
    }
}

//! Bounded retry with a fixed pause
//!
//! The dispatcher wraps every call in [`retry_with_backoff`] with a
//! predicate over error kinds, a total attempt budget and a constant
//! interval between attempts.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, the first one included (at least 1)
    pub max_attempts: u32,

    /// Pause before every retry
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(1))
    }
}

impl RetryConfig {
    /// `attempts` tries with a constant pause between them
    pub fn fixed(attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: attempts.max(1),
            interval,
        }
    }
}

/// Result of a retry operation
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final result (success or last error)
    pub result: Result<T, E>,

    /// Number of attempts made
    pub attempts: u32,
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt budget is spent.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    config: &RetryConfig,
    is_retryable: R,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        let err = match operation().await {
            Ok(value) => {
                return RetryResult {
                    result: Ok(value),
                    attempts,
                }
            }
            Err(err) => err,
        };

        if attempts >= config.max_attempts || !is_retryable(&err) {
            return RetryResult {
                result: Err(err),
                attempts,
            };
        }

        tracing::debug!(
            attempt = attempts,
            max_attempts = config.max_attempts,
            delay_ms = config.interval.as_millis() as u64,
            "Retrying after transient failure"
        );

        sleep(config.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryConfig::fixed(0, Duration::ZERO).max_attempts, 1);
        assert_eq!(RetryConfig::default().max_attempts, 3);
        assert_eq!(RetryConfig::default().interval, Duration::from_secs(1));
    }

    async fn run(config: &RetryConfig, fail_times: u32, retryable: bool) -> (RetryResult<u32, String>, u32) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = retry_with_backoff(
            config,
            |_: &String| retryable,
            || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < fail_times {
                        Err(format!("failure {n}"))
                    } else {
                        Ok(n)
                    }
                }
            },
        )
        .await;
        (result, calls.load(Ordering::SeqCst))
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_attempt() {
        let started = Instant::now();
        let (result, calls) = run(&RetryConfig::default(), 0, true).await;
        assert_eq!(result.result.unwrap(), 0);
        assert_eq!(result.attempts, 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failures() {
        let started = Instant::now();
        let config = RetryConfig::fixed(4, Duration::from_secs(1));
        let (result, calls) = run(&config, 3, true).await;
        assert_eq!(result.result.unwrap(), 3);
        assert_eq!(result.attempts, 4);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert_eq!(calls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhausted() {
        let started = Instant::now();
        let config = RetryConfig::fixed(3, Duration::from_secs(1));
        let (result, calls) = run(&config, 10, true).await;
        assert_eq!(result.result.unwrap_err(), "failure 2");
        assert_eq!(result.attempts, 3);
        // no sleep after the last attempt
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error() {
        let config = RetryConfig::fixed(3, Duration::from_secs(1));
        let (result, calls) = run(&config, 10, false).await;
        assert!(result.result.is_err());
        assert_eq!(result.attempts, 1);
        assert_eq!(calls, 1);
    }
}

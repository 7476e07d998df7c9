//! Timeout helper
//!
//! Bounds a fallible future and keeps the timeout distinguishable from the
//! future's own error.

use std::future::Future;
use std::time::Duration;

/// Apply `timeout` to a fallible future
pub async fn with_timeout<T, E>(
    timeout: Duration,
    future: impl Future<Output = Result<T, E>>,
) -> Result<T, TimeoutError<E>> {
    match tokio::time::timeout(timeout, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(TimeoutError::Inner(err)),
        Err(_) => Err(TimeoutError::Timeout(timeout)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Inner(E),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error, PartialEq)]
    #[error("connection refused")]
    struct Refused;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), async { Ok::<_, Refused>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_with_timeout_inner_error() {
        let err = with_timeout(Duration::from_secs(1), async { Err::<u8, _>(Refused) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
        assert!(matches!(err, TimeoutError::Inner(Refused)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_elapsed() {
        let err = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, Refused>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, TimeoutError::Timeout(d) if d == Duration::from_millis(10)));
    }
}

//! Bounded exponential backoff for transient external-service failures.

use crate::error::{Result, VaultError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: usize,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling for the backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (0-based).
    fn delay_for(&self, retry: u32) -> Duration {
        let delay = self.initial_delay.saturating_mul(2u32.saturating_pow(retry));
        delay.min(self.max_delay)
    }
}

/// Run an async operation, retrying transient failures with backoff.
///
/// Non-transient errors (see [`VaultError::is_transient`]) surface
/// immediately; the last transient error surfaces once attempts are
/// exhausted.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_err: Option<VaultError> = None;

    for attempt in 0..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt as u32);
                warn!(
                    "Transient failure (attempt {}/{}), retrying in {:?}: {}",
                    attempt + 1,
                    attempts,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| VaultError::Config("retry with zero attempts".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicUsize::new(0);

        let result = retry(&fast_policy(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(VaultError::EmbeddingFailed("rate limit".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_transient_fails_immediately() {
        let calls = AtomicUsize::new(0);

        let result: Result<()> = retry(&fast_policy(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(VaultError::TranscriptionRejected("silence".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = AtomicUsize::new(0);

        let result: Result<()> = retry(&fast_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(VaultError::EmbeddingFailed("down".into())) }
        })
        .await;

        assert!(matches!(result, Err(VaultError::EmbeddingFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(6), Duration::from_secs(8));
    }
}

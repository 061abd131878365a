// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bounded exponential backoff
//!
//! One configurable policy applied uniformly to all metadata-store writes.
//! Only errors classified transient by `MediaryError::is_retryable` are
//! retried; everything else propagates on the first attempt.

use mediary_core::MediaryResult;
use std::future::Future;
use std::time::Duration;

/// Retry policy for transient backend errors
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            factor: 2,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            factor: 1,
        }
    }

    /// Run `op`, retrying transient failures with exponential backoff.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> MediaryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = MediaryResult<T>>,
    {
        let mut delay = self.base_delay;
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(error = %err, attempt, "transient error, backing off");
                    tokio::time::sleep(delay).await;
                    delay *= self.factor;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediary_core::MediaryError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_recovers_from_transient_errors() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result = policy
            .run(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(MediaryError::Network("reset".into()))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: MediaryResult<()> = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(MediaryError::Timeout)
            })
            .await;

        assert!(matches!(result, Err(MediaryError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: MediaryResult<()> = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(MediaryError::NotFound("it_1".into()))
            })
            .await;

        assert!(matches!(result, Err(MediaryError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_policy_is_single_shot() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::none();

        let result: MediaryResult<()> = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(MediaryError::Timeout)
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

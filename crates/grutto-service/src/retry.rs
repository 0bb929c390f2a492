//! Bounded retry for idempotent reads.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use grutto_core::result::AppResult;

/// How often and how patiently a read is retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub attempts: u32,
    /// Delay before the first retry; doubles after each failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Run `op`, retrying transient failures with exponential backoff.
    ///
    /// Only for reads. Non-transient errors return immediately.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut delay = self.base_delay;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.kind.is_transient() && attempt < attempts => {
                    warn!(operation, attempt, error = %e, "Transient read failure, retrying");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use grutto_core::error::AppError;

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::default()
            .run("list_files", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AppError::database("connection reset"))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = RetryPolicy::default()
            .run("list_files", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::service_unavailable("pool exhausted"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = RetryPolicy::default()
            .run("get_folder", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::not_found("Folder not found"))
            })
            .await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

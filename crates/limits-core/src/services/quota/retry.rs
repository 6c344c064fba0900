//! Throttling-aware retry
//!
//! Only rate-limit rejections are retried. After failed attempt `k`
//! (1-indexed) the caller sleeps `k² × base_delay` before attempt `k + 1`.

use std::future::Future;
use std::time::Duration;

use super::provider::ApiError;

/// Default number of attempts, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default backoff unit
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Bounded quadratic backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay unit multiplied by `attempt²`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay after failed attempt `attempt` (1-indexed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.saturating_mul(attempt)
    }

    /// Run `operation`, retrying while it fails with a throttling error.
    ///
    /// Non-throttling errors are returned immediately. When every attempt is
    /// throttled the last error is returned.
    pub async fn run<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_throttling() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    log::debug!(
                        "[quota:retry] {} throttled (attempt {}/{}), backing off {:?}",
                        label,
                        attempt,
                        max_attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_throttling() {
                        log::warn!(
                            "[quota:retry] {} still throttled after {} attempts",
                            label,
                            max_attempts
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

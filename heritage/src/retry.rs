//! Bounded exponential backoff around a single async call.

use shared_http::FailureKind;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for FailureKind {
    fn is_retryable(&self) -> bool {
        FailureKind::is_retryable(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: u32,
    /// Wait before the first retry; doubles on each further retry.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, initial_delay: Duration) -> Self {
        Self {
            retries,
            initial_delay,
        }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_config(config: &shared::config::ClientConfig) -> Self {
        Self::new(config.retry_attempts, config.retry_delay)
    }

    /// The waits a call that keeps failing would go through.
    pub fn delays(&self) -> Vec<Duration> {
        (0..self.retries)
            .map(|i| self.initial_delay.saturating_mul(2u32.saturating_pow(i)))
            .collect()
    }

    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        E: Retryable,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        retry(operation, self.retries, self.initial_delay).await
    }
}

/// Run `operation`, retrying up to `attempts_remaining` more times with the
/// wait doubling from `delay`. Non-retryable failures return at once.
pub async fn retry<T, E, F, Fut>(
    mut operation: F,
    mut attempts_remaining: u32,
    mut delay: Duration,
) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempts_remaining == 0 || !err.is_retryable() => return Err(err),
            Err(_) => {
                debug!(
                    "Attempt failed, retrying in {:?} ({} left)",
                    delay, attempts_remaining
                );
                tokio::time::sleep(delay).await;
                attempts_remaining -= 1;
                delay = delay.saturating_mul(2);
            }
        }
    }
}

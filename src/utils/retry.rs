use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio_retry::RetryIf;
use tracing::warn;

use crate::config::RetryConfig;
use crate::utils::error::{AppError, Result};

/// Decides whether an error is worth another attempt.
pub type RetryPredicate = fn(&AppError) -> bool;

/// Exponential backoff shared by the row store, the scrapers and the notifier.
///
/// The first retry waits `base_delay`, every following one doubles it, and no
/// single wait exceeds `max_delay`. `max_attempts` counts the initial call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    retryable: RetryPredicate,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        retryable: RetryPredicate,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            retryable,
        }
    }

    pub fn from_config(config: &RetryConfig, retryable: RetryPredicate) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            retryable,
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Waits applied between consecutive attempts.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let base = self.base_delay;
        let cap = self.max_delay;
        (0..self.max_attempts - 1).map(move |n| base.saturating_mul(2u32.saturating_pow(n)).min(cap))
    }

    /// Runs `action` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget is spent. The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut action: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = AtomicU32::new(0);
        let max_attempts = self.max_attempts;

        RetryIf::spawn(
            self.delays(),
            || {
                attempts.fetch_add(1, Ordering::Relaxed);
                action()
            },
            |err: &AppError| {
                let attempt = attempts.load(Ordering::Relaxed);
                let retry = (self.retryable)(err);
                if retry && attempt < max_attempts {
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Attempt failed, backing off before retry"
                    );
                }
                retry
            },
        )
        .await
    }
}

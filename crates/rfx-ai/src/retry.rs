//! Retry executor with exponential backoff for single provider calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use rfx_types::{GatewayError, Result};
use tokio_util::sync::CancellationToken;

/// Backoff policy controlling how many times, and how far apart, a call is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub initial_delay: Duration,
    /// Applied multiplicatively after every retry.
    pub backoff_multiplier: f64,
    /// Treat `GatewayError::Timeout` as retryable.
    pub retry_on_timeout: bool,
    /// Scale each delay by a random factor in `[0.5, 1.0]`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(2000),
            backoff_multiplier: 1.5,
            retry_on_timeout: false,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt + 1` (0-indexed):
    /// `initial_delay * backoff_multiplier^attempt`, without jitter.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.min(i32::MAX as usize) as i32);
        let micros = (self.initial_delay.as_micros() as f64 * factor).round();
        Duration::from_micros(micros as u64)
    }

    pub fn should_retry(&self, err: &GatewayError) -> bool {
        err.is_retryable() || (self.retry_on_timeout && err.is_timeout())
    }

    fn apply_jitter(&self, delay: Duration) -> Duration {
        if !self.jitter {
            return delay;
        }
        let factor: f64 = rand::rng().random_range(0.5..=1.0);
        delay.mul_f64(factor)
    }
}

/// Execute `f` with retry logic.
///
/// `f` is called up to `max_retries + 1` times. A failure is retried only when
/// [`RetryPolicy::should_retry`] accepts it and retries remain; any other failure
/// is returned immediately. Cancelling `cancel` aborts both an in-flight attempt
/// and a backoff sleep with [`GatewayError::Cancelled`].
pub async fn execute_with_retry<F, Fut, T>(
    mut f: F,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    label: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..=policy.max_retries {
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            r = f() => r,
        };

        match result {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(call = %label, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < policy.max_retries && policy.should_retry(&e) => {
                let delay = policy.apply_jitter(policy.delay_for_attempt(attempt));
                tracing::warn!(
                    call = %label,
                    attempt,
                    retries_left = policy.max_retries - attempt,
                    delay_ms = %delay.as_millis(),
                    error = %e,
                    "Retryable error, backing off"
                );
                last_err = Some(e);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| GatewayError::Other(format!("{label}: no attempt was made"))))
}

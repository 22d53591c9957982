//! Retry policy and pacing for outbound requests.
//!
//! Delays are computed by [`RetryPolicy`] and waited out through a
//! [`Sleeper`], so tests can record them instead of sleeping.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::error::RemoteResult;

/// Bounded exponential backoff with jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Extra random fraction of the backoff added to each delay, in `[0, 1]`.
    pub jitter: f64,
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self { max_attempts: 1, base_delay: Duration::ZERO, max_delay: Duration::ZERO, jitter: 0.0 }
    }

    /// Backoff after failed attempt `attempt` (1-based), before jitter.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1 << exponent).min(self.max_delay)
    }

    /// Delay before the next attempt.
    ///
    /// `sample` is a uniform draw from `[0, 1)`. A server-supplied
    /// `retry_after` raises the delay to at least that value.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>, sample: f64) -> Duration {
        let backoff = self.backoff(attempt);
        let extra = backoff.mul_f64(self.jitter.clamp(0.0, 1.0) * sample.clamp(0.0, 1.0));
        (backoff + extra).max(retry_after.unwrap_or_default()).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        use crate::config::api;
        Self {
            max_attempts: api::MAX_ATTEMPTS,
            base_delay: api::BACKOFF_BASE,
            max_delay: api::BACKOFF_MAX,
            jitter: api::BACKOFF_JITTER,
        }
    }
}

/// Waits out politeness intervals and retry delays.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the Tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Minimum gap between outbound requests, shared by every caller.
///
/// Callers queue on the lock, so concurrent searches on one client are
/// spaced out just like the batches of a single search.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_send: tokio::sync::Mutex<Option<Instant>>,
}

impl Pacer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_send: tokio::sync::Mutex::new(None) }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until `interval` has passed since the previous send, then
    /// claim the current instant as the next send.
    pub async fn wait(&self, sleeper: &dyn Sleeper) {
        if self.interval.is_zero() {
            return;
        }

        let mut last_send = self.last_send.lock().await;
        if let Some(previous) = *last_send {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                sleeper.sleep(self.interval - elapsed).await;
            }
        }
        *last_send = Some(Instant::now());
    }
}

/// Run `op` under `policy`, retrying transient failures.
///
/// Permanent failures are returned immediately; after the last attempt the
/// final transient error is returned.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    label: &str,
    mut op: F,
) -> RemoteResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RemoteResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(label, attempt, "Request succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let sample: f64 = rand::thread_rng().r#gen();
                let delay = policy.delay_for(attempt, err.retry_after(), sample);
                tracing::warn!(
                    label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient failure, retrying"
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::debug!(label, attempt, error = %err, retryable = err.is_retryable(), "Giving up");
                return Err(err);
            }
        }
    }
}

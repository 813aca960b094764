//! Bounded retries with randomized exponential backoff.
//!
//! The policy is a pure decision function so backoff behavior is testable
//! without real delays; the driver owns the sleeping and is cancelled by
//! dropping its future.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use dp_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Linear-in-attempt backoff with a jitter ceiling, applied between failed
/// attempts: after attempt `n` of `max_attempts`, wait `n * base_delay` plus
/// up to `max_jitter`.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    /// Decide what follows the given failed attempt (1-based).
    pub fn decide(&self, failed_attempt: u32) -> RetryDecision {
        if failed_attempt >= self.max_attempts {
            RetryDecision::GiveUp
        } else {
            RetryDecision::RetryAfter(self.base_delay * failed_attempt)
        }
    }

    fn sample_jitter(&self) -> Duration {
        let ceiling = self.max_jitter.as_millis() as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..ceiling))
    }
}

/// Drive `op` under `policy`, bounding each attempt by `attempt_timeout`.
/// Returns the first success, or the last observed error once the attempt
/// budget is spent. Dropping the returned future aborts an in-progress
/// attempt or backoff wait immediately.
pub async fn run<T, F, Fut>(
    policy: &BackoffPolicy,
    attempt_timeout: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1u32;
    loop {
        info!(attempt, max_attempts = policy.max_attempts, "starting attempt");
        let result = match timeout(attempt_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Generation(format!(
                "attempt timed out after {}s",
                attempt_timeout.as_secs()
            ))),
        };

        let error = match result {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match policy.decide(attempt) {
            RetryDecision::GiveUp => {
                warn!(attempt, error = %error, "attempt failed, giving up");
                return Err(error);
            }
            RetryDecision::RetryAfter(delay) => {
                warn!(attempt, error = %error, delay_secs = delay.as_secs(), "attempt failed, backing off");
                sleep(delay + policy.sample_jitter()).await;
            }
        }
        attempt += 1;
    }
}

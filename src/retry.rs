//! Bounded exponential-backoff retry of a single source.
//!
//! This re-invokes the *same* source. It is independent of
//! [`FallbackResolver`](crate::resolver::FallbackResolver), which tries
//! *different* sources once each.

use crate::result::{ErrorKind, LookupResult};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    unit: Duration,
}

impl RetryPolicy {
    /// `max_attempts` below 1 is raised to 1.
    pub fn new(max_attempts: u32, unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Same policy with a different attempt budget.
    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self::new(max_attempts, self.unit)
    }

    /// Wait after failed attempt `attempt` (0-based): `unit * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.unit.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Call `op` until it returns a success or the policy runs out of attempts.
///
/// `op` receives the 0-based attempt index. Success returns immediately; there
/// is no wait after the final attempt.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> LookupResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = LookupResult<T>>,
{
    let max_attempts = policy.max_attempts();

    for attempt in 0..max_attempts {
        let result = op(attempt).await;
        if result.is_success() {
            info!(label = label, attempt = attempt + 1, "Succeeded");
            return result;
        }

        warn!(
            label = label,
            attempt = attempt + 1,
            max_attempts = max_attempts,
            error = result.message().unwrap_or_default(),
            "Attempt failed"
        );

        if attempt + 1 < max_attempts {
            let wait = policy.backoff(attempt);
            info!(label = label, wait_ms = wait.as_millis() as u64, "Waiting before retry");
            tokio::time::sleep(wait).await;
        }
    }

    error!(label = label, max_attempts = max_attempts, "Retries exhausted");
    LookupResult::error(
        ErrorKind::RetriesExhausted,
        format!("Failed to {} after {} attempts", label, max_attempts),
    )
}

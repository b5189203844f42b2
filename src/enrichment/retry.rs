//! Retry-with-backoff decorator around an [`AddressLookup`]

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::enrichment::client::AddressLookup;
use crate::enrichment::models::AddressInfo;

/// Exponential backoff policy
///
/// The wait before retry `i` (0-based) is `base_wait * multiplier^i`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_wait: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_WAIT: Duration = Duration::from_millis(500);
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;

    pub fn new(max_attempts: u32, base_wait: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_wait,
            multiplier: if multiplier.is_finite() && multiplier >= 1.0 {
                multiplier
            } else {
                Self::DEFAULT_MULTIPLIER
            },
        }
    }

    /// Wait before the retry following failed attempt `attempt_index`
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        let factor = self.multiplier.powi(attempt_index as i32);
        // float-to-int casts saturate, so huge exponents clamp instead of overflowing
        Duration::from_nanos((self.base_wait.as_nanos() as f64 * factor).round() as u64)
    }

    /// Upper bound on time spent sleeping for a single address
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|i| self.backoff_delay(i))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_ATTEMPTS,
            Self::DEFAULT_BASE_WAIT,
            Self::DEFAULT_MULTIPLIER,
        )
    }
}

/// Wraps a raw lookup with retries; never fails
///
/// Retryable errors are retried up to the policy's attempt limit. On a
/// non-retryable error or once attempts run out, the unknown sentinel is
/// returned instead of the error.
pub struct RetryingLookupClient {
    inner: Arc<dyn AddressLookup>,
    policy: RetryPolicy,
}

impl RetryingLookupClient {
    pub fn new(inner: Arc<dyn AddressLookup>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn resolve(&self, address: &str) -> AddressInfo {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 0..max_attempts {
            let error = match self.inner.resolve(address).await {
                Ok(info) => {
                    if attempt > 0 {
                        debug!(address, attempts = attempt + 1, "Lookup succeeded after retry");
                    }
                    return info;
                }
                Err(e) => e,
            };

            if !error.is_retryable() {
                warn!(address, error = %error, "Lookup failed with non-retryable error");
                return AddressInfo::unknown(address);
            }

            if attempt + 1 == max_attempts {
                warn!(
                    address,
                    attempts = max_attempts,
                    error = %error,
                    "All lookup retries exhausted"
                );
                break;
            }

            let delay = self.policy.backoff_delay(attempt);
            warn!(
                address,
                attempt = attempt + 1,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying lookup after failure"
            );
            tokio::time::sleep(delay).await;
        }

        AddressInfo::unknown(address)
    }
}

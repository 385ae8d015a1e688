//! Bounded retry with exponential backoff and jitter.
//!
//! Every outbound provider call goes through one retry policy so transient
//! network/5xx failures degrade to an empty result instead of a missing
//! calendar. The pipeline retries each batch item at most once, so the
//! default policy allows two attempts total.

use anyhow::Result;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial try)
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (cap for exponential backoff)
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 150,
            max_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Load retry policy from environment variables with safe defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: std::env::var("RETRY_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0 && n <= 5)
                .unwrap_or(defaults.max_attempts),
            base_delay_ms: std::env::var("RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.base_delay_ms),
            max_delay_ms: std::env::var("RETRY_MAX_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_delay_ms),
        }
    }

    /// Backoff delay for a given attempt with full jitter:
    /// min(max_delay, base_delay * 2^(attempt-1)), random in [0, capped).
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let capped = self.capped_backoff(attempt);
        if capped == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..capped)
        }
    }

    fn capped_backoff(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1);
        let multiplier = if exponent >= 32 {
            u64::MAX
        } else {
            1u64 << exponent
        };
        self.base_delay_ms
            .saturating_mul(multiplier)
            .min(self.max_delay_ms)
    }
}

/// Check whether an error chain represents a transient failure worth one
/// more attempt.
///
/// Retryable: network/IO errors, HTTP 408/425/429, HTTP 5xx.
/// Not retryable: other 4xx, parsing/validation errors.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    if let Some(reqwest_err) = err.downcast_ref::<reqwest::Error>() {
        if let Some(status) = reqwest_err.status() {
            return matches!(status.as_u16(), 408 | 425 | 429 | 500..=599);
        }
        return reqwest_err.is_timeout() || reqwest_err.is_connect() || reqwest_err.is_request();
    }
    // Unclassified errors are treated as transient.
    true
}

/// Retry an async operation under the given policy.
///
/// `op_name` is used for logging only. Returns the final error once
/// attempts are exhausted or a non-retryable error is seen.
pub async fn retry_async<T, Fut, F>(policy: &RetryPolicy, op_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("retry op={} succeeded after {} attempts", op_name, attempt);
                }
                return Ok(value);
            }
            Err(err) => {
                if !is_retryable(&err) {
                    debug!("retry op={} non-retryable error: {}", op_name, err);
                    return Err(err);
                }

                if attempt >= policy.max_attempts {
                    warn!(
                        "retry op={} failed after {} attempts: {}",
                        op_name, attempt, err
                    );
                    return Err(err);
                }

                let backoff_ms = policy.backoff_ms(attempt);
                debug!(
                    "retry op={} attempt={} backoff_ms={}",
                    op_name, attempt, backoff_ms
                );
                if backoff_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }

                attempt += 1;
            }
        }
    }
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Retry with exponential backoff.
//!
//! Every store read and write the replicators perform goes through
//! [`retry_with_backoff`]. Outcome notifications do not: a failure to report
//! is surfaced as-is.
//!
//! # Backoff Schedule
//!
//! The wait after failed attempt `i` (0-based) is `initial_delay * 2^i`.
//! There is no jitter and no ceiling. The last permitted attempt never waits;
//! its error is returned immediately and unchanged.
//!
//! ```text
//! Attempt  Wait after failure (default 1s)
//! -------  -------------------------------
//! 1        1s
//! 2        2s
//! 3        4s
//! 4        8s
//! 5        none, error returned
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), String> {
//! use prod_replicator::resilience::{retry_with_backoff, RetryConfig};
//!
//! let config = RetryConfig::default();
//! let value = retry_with_backoff(&config, "fetch", || async { Ok::<_, String>(42) }).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use crate::metrics;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of attempts per operation.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Default wait after the first failed attempt.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Retry policy for one fallible operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: usize,

    /// Wait after the first failure; doubles after each subsequent one.
    pub initial_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: usize, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
        }
    }

    /// Fast-fail retry for tests.
    pub fn testing() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(1),
        }
    }

    /// Wait after failed attempt `attempt` (0-based): `initial_delay * 2^attempt`.
    ///
    /// Saturates at `Duration::MAX` instead of overflowing.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        match u32::try_from(attempt).ok().and_then(|a| 1u32.checked_shl(a)) {
            Some(factor) => self.initial_delay.saturating_mul(factor),
            None => Duration::MAX,
        }
    }

    /// Sum of every wait taken when all attempts fail.
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts.max(1) - 1)
            .map(|attempt| self.delay_for_attempt(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// Run `operation` until it succeeds or `config.max_attempts` is reached.
///
/// On success the value is returned and no further attempts are made. When
/// every attempt fails, the error of the final attempt is returned as-is.
/// `operation_name` labels the retry log lines and metrics.
pub async fn retry_with_backoff<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation = operation_name, attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt + 1 >= max_attempts => {
                warn!(
                    operation = operation_name,
                    attempts = max_attempts,
                    error = %e,
                    "Operation failed, retries exhausted"
                );
                return Err(e);
            }
            Err(e) => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay_millis(delay),
                    error = %e,
                    "Retry {}/{} after {}ms",
                    attempt + 1,
                    max_attempts,
                    delay_millis(delay)
                );
                metrics::record_retry(operation_name);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Whole milliseconds in `delay`, saturating at `u64::MAX`.
fn delay_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

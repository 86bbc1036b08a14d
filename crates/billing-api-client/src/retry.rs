//! Retry decision and backoff between attempts.
//!
//! The decision is a pure function of the number of retries already made and
//! the outcome of the last attempt. Transport failures (connect errors,
//! timeouts, DNS failures alike) are always treated as retryable; permanent
//! and transient network errors are not told apart.

use std::time::Duration;

/// Outcome of a single HTTP attempt, as seen by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A response was received with the given status code.
    Response(u16),
    /// No response: the transport failed (connect error, timeout, ...).
    TransportFailure,
}

/// Decide whether another attempt should be made.
///
/// `retries_so_far` counts retries already sent, so it is 0 after the
/// initial attempt. With `max_retries == 0` exactly one attempt is made.
#[must_use]
pub const fn should_retry(retries_so_far: u32, max_retries: u32, outcome: AttemptOutcome) -> bool {
    if retries_so_far >= max_retries {
        return false;
    }
    match outcome {
        AttemptOutcome::Response(status) => status >= 500,
        AttemptOutcome::TransportFailure => true,
    }
}

/// Exponential backoff with optional jitter between retries.
///
/// The delay before retry `n` (1-based) is `base * factor^(n - 1)`, capped at
/// `max`. Jitter spreads the delay by +/- 50%.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub base: Duration,
    /// Multiplier applied for each subsequent retry.
    pub factor: f64,
    /// Upper bound of a single delay.
    pub max: Duration,
    /// Whether to apply random jitter.
    pub jitter: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            factor: 2.0,
            max: Duration::from_secs(60),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Retry immediately, without waiting.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            base: Duration::ZERO,
            factor: 1.0,
            max: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay to wait before retry number `retry` (1-based).
    #[must_use]
    pub fn delay(self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let seconds = self.base.as_secs_f64() * self.factor.powi(exponent);
        let capped = seconds.min(self.max.as_secs_f64());
        if !capped.is_finite() || capped <= 0.0 {
            return Duration::ZERO;
        }

        let delay = Duration::from_secs_f64(capped);
        if !self.jitter {
            return delay;
        }

        // +/- 50%
        let spread = fastrand::f64() + 0.5;
        delay.mul_f64(spread)
    }
}

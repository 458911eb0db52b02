//! Retry policy for upstream calls.
//!
//! The backoff schedule is a pure function of the attempt index so that it
//! can be asserted exactly in tests. Jitter is a fixed fraction of the base
//! delay rather than a random value.

use std::time::Duration;

/// Total attempts per call, including the first try.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Base delay for exponential backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);

/// Per-request timeout, independent of the backoff pacing.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// Retry and timeout settings for the resilient client.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use zeke_core::RetryPolicy;
///
/// let policy = RetryPolicy::new().with_base_delay(Duration::from_millis(100));
/// assert_eq!(policy.delay(0), Duration::from_millis(130));
/// assert_eq!(policy.delay(2), Duration::from_millis(430));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default schedule (4 attempts, 250ms base, 25s timeout).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total number of attempts. Values below 1 are treated as 1.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        self
    }

    /// Set the base delay for exponential backoff.
    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the timeout applied to each individual request.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Fixed jitter added to every delay: 30% of the base delay.
    pub fn jitter(&self) -> Duration {
        self.base_delay.saturating_mul(3) / 10
    }

    /// Delay to wait after the given 0-based attempt: `2^attempt * base + jitter`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .saturating_mul(factor)
            .saturating_add(self.jitter())
    }

    /// Whether `attempt` (0-based) is the final one allowed.
    pub const fn is_last_attempt(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) >= self.max_attempts
    }
}

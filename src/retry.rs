//! Retry scheduling for failed producers.
//!
//! Every fetch and mutation runs its producer through the same loop: on
//! failure, [`RetryPolicy`] decides whether another attempt happens and
//! [`RetryDelay`] decides how long to wait before it. Both are pure values
//! with no knowledge of the engine driving them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default retry budget for queries.
///
/// Mutations default to no retries at all; see
/// [`MutationOptions`](crate::config::MutationOptions).
pub const DEFAULT_RETRIES: u32 = 3;

/// Upper bound for the default exponential backoff.
const MAX_BACKOFF: Duration = Duration::from_millis(30_000);

/// How many times a failed producer call is re-attempted.
///
/// The budget counts *retries*, not total attempts: a policy of 2 allows one
/// initial call plus two re-attempts, three producer invocations in total.
///
/// # Example
///
/// ```
/// use freshet::retry::RetryPolicy;
///
/// let policy = RetryPolicy::attempts(2);
/// assert!(policy.should_retry(0)); // first retry
/// assert!(policy.should_retry(1)); // second retry
/// assert!(!policy.should_retry(2)); // budget exhausted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    /// Creates a policy allowing up to `max_retries` re-attempts.
    #[must_use]
    pub const fn attempts(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Creates a policy that never retries.
    #[must_use]
    pub const fn never() -> Self {
        Self::attempts(0)
    }

    /// Returns the maximum number of re-attempts.
    #[must_use]
    pub const fn max_retries(self) -> u32 {
        self.max_retries
    }

    /// Returns `true` if another attempt should be made.
    ///
    /// `attempt` is the number of retries already performed, so the first
    /// retry decision is made with `attempt = 0`.
    #[must_use]
    pub const fn should_retry(self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

impl Default for RetryPolicy {
    /// Queries retry up to [`DEFAULT_RETRIES`] times.
    fn default() -> Self {
        Self::attempts(DEFAULT_RETRIES)
    }
}

impl From<bool> for RetryPolicy {
    /// `true` maps to the default budget, `false` to no retries.
    fn from(retry: bool) -> Self {
        if retry {
            Self::attempts(DEFAULT_RETRIES)
        } else {
            Self::never()
        }
    }
}

impl From<u32> for RetryPolicy {
    fn from(max_retries: u32) -> Self {
        Self::attempts(max_retries)
    }
}

/// How long to pause before a retry attempt.
///
/// The attempt number handed to [`RetryDelay::delay_for`] is 1-based: the
/// wait before the first retry is computed for attempt 1.
#[derive(Clone)]
pub enum RetryDelay {
    /// The default curve: `min(1000 * 2^attempt, 30_000)` milliseconds.
    Exponential,
    /// The same pause before every retry.
    Fixed(Duration),
    /// A caller-supplied function of the attempt number.
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl RetryDelay {
    /// Wraps a function of the 1-based attempt number.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use freshet::retry::RetryDelay;
    ///
    /// let delay = RetryDelay::custom(|attempt| Duration::from_millis(50 * u64::from(attempt)));
    /// assert_eq!(delay.delay_for(2), Duration::from_millis(100));
    /// ```
    pub fn custom(f: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Returns the pause before the given 1-based retry attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            // 2^5 * 1000 already exceeds the cap, so the shift stays in range
            Self::Exponential => {
                let backoff = Duration::from_millis(1000 << attempt.min(5));
                backoff.min(MAX_BACKOFF)
            }
            Self::Fixed(delay) => *delay,
            Self::Custom(f) => f(attempt),
        }
    }
}

impl Default for RetryDelay {
    fn default() -> Self {
        Self::Exponential
    }
}

impl fmt::Debug for RetryDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exponential => write!(f, "Exponential"),
            Self::Fixed(delay) => f.debug_tuple("Fixed").field(delay).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_counts_retries_not_attempts() {
        let policy = RetryPolicy::attempts(2);
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn test_never_retries() {
        let policy = RetryPolicy::never();
        assert_eq!(policy.max_retries(), 0);
        assert!(!policy.should_retry(0));
    }

    #[test]
    fn test_default_budget() {
        assert_eq!(RetryPolicy::default().max_retries(), DEFAULT_RETRIES);
    }

    #[test]
    fn test_from_bool() {
        assert_eq!(RetryPolicy::from(true).max_retries(), DEFAULT_RETRIES);
        assert_eq!(RetryPolicy::from(false).max_retries(), 0);
    }

    #[test]
    fn test_from_number() {
        assert_eq!(RetryPolicy::from(0u32).max_retries(), 0);
        assert_eq!(RetryPolicy::from(7u32).max_retries(), 7);
    }

    #[test]
    fn test_exponential_doubles_per_attempt() {
        let delay = RetryDelay::Exponential;
        assert_eq!(delay.delay_for(1), Duration::from_millis(2000));
        assert_eq!(delay.delay_for(2), Duration::from_millis(4000));
        assert_eq!(delay.delay_for(3), Duration::from_millis(8000));
        assert_eq!(delay.delay_for(4), Duration::from_millis(16_000));
    }

    #[test]
    fn test_exponential_caps_at_thirty_seconds() {
        let delay = RetryDelay::Exponential;
        assert_eq!(delay.delay_for(5), Duration::from_millis(30_000));
        assert_eq!(delay.delay_for(6), Duration::from_millis(30_000));
        assert_eq!(delay.delay_for(u32::MAX), Duration::from_millis(30_000));
    }

    #[test]
    fn test_fixed_delay() {
        let delay = RetryDelay::Fixed(Duration::from_millis(250));
        assert_eq!(delay.delay_for(1), Duration::from_millis(250));
        assert_eq!(delay.delay_for(9), Duration::from_millis(250));
    }

    #[test]
    fn test_custom_delay_receives_one_based_attempt() {
        let delay = RetryDelay::custom(|attempt| Duration::from_millis(u64::from(attempt)));
        assert_eq!(delay.delay_for(1), Duration::from_millis(1));
        assert_eq!(delay.delay_for(3), Duration::from_millis(3));
    }
}

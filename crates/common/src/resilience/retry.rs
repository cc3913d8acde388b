//! Retry policy with exponential backoff for transient remote failures
//!
//! A [`RetryPolicy`] is a plain value: the batch executor and the query
//! cursor each hold one and consult it whenever a remote call fails. The
//! decision of whether to retry is delegated to the error itself through
//! [`ErrorClassification`], and a server-provided delay (`Retry-After`)
//! replaces the computed backoff, bounded by the backoff's ceiling.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ErrorClassification;

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation after the given delay
    RetryAfter(Duration),
    /// Don't retry the operation
    Stop,
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Exponential backoff: initial_delay * base^retry, capped at max_delay
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Calculate the delay before the given retry (0-based)
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
                let delay = initial_delay.as_millis() as f64 * base.powi(exponent);
                let delay_ms = delay.min(max_delay.as_millis() as f64);
                Duration::from_millis(delay_ms as u64)
            }
        }
    }

    /// Longest delay this strategy will ever wait
    pub fn max_delay(&self) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Exponential { max_delay, .. } => *max_delay,
        }
    }
}

/// Retry budget and pacing for a remote operation
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Backoff strategy for calculating delays
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    /// Three attempts, 1s base, factor 2, capped at 30s.
    fn default() -> Self {
        Self::exponential(3, Duration::from_secs(1), Duration::from_secs(30))
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and backoff
    pub fn new(max_attempts: u32, backoff: BackoffStrategy) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff }
    }

    /// Exponential backoff doubling from `initial_delay` up to `max_delay`
    pub fn exponential(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self::new(
            max_attempts,
            BackoffStrategy::Exponential { initial_delay, base: 2.0, max_delay },
        )
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::new(1, BackoffStrategy::Fixed(Duration::ZERO))
    }

    /// Delay before the given retry; a server hint replaces the computed
    /// value but never exceeds the backoff's maximum delay
    pub fn delay_for(&self, retry: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => hint.min(self.backoff.max_delay()),
            None => self.backoff.calculate_delay(retry),
        }
    }

    /// Decide what to do after `attempt` (1-based) failed with `error`
    pub fn decide<E: ErrorClassification>(&self, error: &E, attempt: u32) -> RetryDecision {
        if !error.is_retryable() || attempt >= self.max_attempts {
            return RetryDecision::Stop;
        }
        RetryDecision::RetryAfter(self.delay_for(attempt - 1, error.retry_after()))
    }

    /// Run `operation` until it succeeds, fails permanently or the budget
    /// runs out; the last error is returned unchanged.
    ///
    /// The closure receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        E: ErrorClassification + fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            debug!(operation = label, attempt, max_attempts = self.max_attempts, "attempting");
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => match self.decide(&error, attempt) {
                    RetryDecision::Stop => {
                        if error.is_retryable() {
                            warn!(operation = label, attempt, error = %error, "retry budget exhausted");
                        }
                        return Err(error);
                    }
                    RetryDecision::RetryAfter(delay) => {
                        warn!(
                            operation = label,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "transient failure, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::ErrorSeverity;

    #[derive(Debug)]
    struct TestError {
        retryable: bool,
        hint: Option<Duration>,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test error (retryable: {})", self.retryable)
        }
    }

    impl ErrorClassification for TestError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }

        fn severity(&self) -> ErrorSeverity {
            ErrorSeverity::Warning
        }

        fn retry_after(&self) -> Option<Duration> {
            self.hint
        }
    }

    fn transient() -> TestError {
        TestError { retryable: true, hint: None }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::exponential(max_attempts, Duration::from_millis(1), Duration::from_millis(4))
    }

    #[test]
    fn default_policy_doubles_from_one_second_up_to_thirty() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(0, None), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1, None), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4, None), Duration::from_secs(16));
        assert_eq!(policy.delay_for(5, None), Duration::from_secs(30));
        assert_eq!(policy.delay_for(20, None), Duration::from_secs(30));
    }

    #[test]
    fn server_hint_overrides_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0, Some(Duration::from_secs(7))), Duration::from_secs(7));

        let error = TestError { retryable: true, hint: Some(Duration::from_secs(5)) };
        assert_eq!(policy.decide(&error, 1), RetryDecision::RetryAfter(Duration::from_secs(5)));
    }

    #[test]
    fn server_hint_is_capped_at_max_delay() {
        let policy = RetryPolicy::default();
        let error = TestError { retryable: true, hint: Some(Duration::from_secs(3600)) };
        assert_eq!(policy.decide(&error, 1), RetryDecision::RetryAfter(Duration::from_secs(30)));
        assert_eq!(policy.delay_for(2, Some(Duration::from_secs(31))), Duration::from_secs(30));

        let fixed = RetryPolicy::new(3, BackoffStrategy::Fixed(Duration::from_millis(250)));
        assert_eq!(fixed.delay_for(0, Some(Duration::from_secs(60))), Duration::from_millis(250));
        assert_eq!(fixed.delay_for(0, Some(Duration::from_millis(100))), Duration::from_millis(100));
    }

    #[test]
    fn decide_stops_on_permanent_error_and_exhausted_budget() {
        let policy = RetryPolicy::default();
        let permanent = TestError { retryable: false, hint: None };
        assert_eq!(policy.decide(&permanent, 1), RetryDecision::Stop);
        assert_eq!(policy.decide(&transient(), 3), RetryDecision::Stop);
        assert_eq!(
            policy.decide(&transient(), 2),
            RetryDecision::RetryAfter(Duration::from_secs(2))
        );
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let policy = RetryPolicy::new(0, BackoffStrategy::Fixed(Duration::ZERO));
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(RetryPolicy::no_retry().decide(&transient(), 1), RetryDecision::Stop);
    }

    #[tokio::test]
    async fn run_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, TestError> = fast_policy(3)
            .run("flaky", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(transient())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.ok(), Some("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_returns_last_error_when_budget_runs_out() {
        let calls = AtomicU32::new(0);
        let result: Result<(), TestError> = fast_policy(3)
            .run("always-failing", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), TestError> = fast_policy(5)
            .run("rejected", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { retryable: false, hint: None }) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

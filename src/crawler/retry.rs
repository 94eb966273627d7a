//! Retry policy for transient download failures.
//!
//! A failed transfer is classified as transient or permanent; transient
//! failures are retried with exponential backoff, bounded by a maximum
//! attempt count. The schedule is deterministic so callers can rely on the
//! exact delay sequence.

use std::time::Duration;

/// Largest exponent applied to the backoff base; keeps the doubling from
/// overflowing Duration arithmetic with pathological retry counts.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Classification of a failed download attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry: timeouts, connection
    /// errors, interrupted streams, HTTP 408/429/5xx.
    Transient,

    /// Failure that retrying will not fix: other HTTP statuses, local I/O
    /// errors, malformed URLs.
    Permanent,
}

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after sleeping for the given delay.
    Retry { delay: Duration },

    /// Stop retrying and surface the failure.
    GiveUp,
}

/// Bounded exponential backoff: `backoff_base * 2^attempt` between attempts,
/// up to `max_retries` additional attempts after the first.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
        }
    }

    /// Returns the configured number of additional attempts.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Decides whether the attempt that just failed should be retried.
    ///
    /// `attempt` is the zero-based index of the failed attempt: the first
    /// failure is attempt 0 and, if retried, sleeps for the backoff base.
    pub fn should_retry(&self, failure: FailureType, attempt: u32) -> RetryDecision {
        if failure == FailureType::Permanent {
            return RetryDecision::GiveUp;
        }

        if attempt >= self.max_retries {
            return RetryDecision::GiveUp;
        }

        RetryDecision::Retry {
            delay: self.delay_for(attempt),
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.pow(attempt.min(MAX_BACKOFF_EXPONENT))
    }
}

/// Classifies an HTTP status code from a download response.
pub fn classify_status(status: u16) -> FailureType {
    match status {
        408 | 429 => FailureType::Transient,
        status if (500..600).contains(&status) => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

/// Classifies a transport-level error from the HTTP client.
///
/// Timeouts, connect failures, and interrupted body streams may all recover
/// on a fresh attempt; errors from building the request will not.
pub fn classify_network(error: &reqwest::Error) -> FailureType {
    if error.is_builder() {
        FailureType::Permanent
    } else {
        FailureType::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_failure_is_retried_with_backoff_base() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        let decision = policy.should_retry(FailureType::Transient, 0);
        assert_eq!(
            decision,
            RetryDecision::Retry {
                delay: Duration::from_secs(1)
            }
        );
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = RetryPolicy::new(4, Duration::from_millis(250));

        let delays: Vec<Duration> = (0..4)
            .map(|attempt| match policy.should_retry(FailureType::Transient, attempt) {
                RetryDecision::Retry { delay } => delay,
                RetryDecision::GiveUp => panic!("expected retry for attempt {}", attempt),
            })
            .collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_millis(250),
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(2000),
            ]
        );
    }

    #[test]
    fn test_retries_are_bounded() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        assert!(matches!(
            policy.should_retry(FailureType::Transient, 1),
            RetryDecision::Retry { .. }
        ));
        assert_eq!(
            policy.should_retry(FailureType::Transient, 2),
            RetryDecision::GiveUp
        );
    }

    #[test]
    fn test_zero_retries_never_retries() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(
            policy.should_retry(FailureType::Transient, 0),
            RetryDecision::GiveUp
        );
    }

    #[test]
    fn test_permanent_failure_is_never_retried() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        assert_eq!(
            policy.should_retry(FailureType::Permanent, 0),
            RetryDecision::GiveUp
        );
    }

    #[test]
    fn test_exponent_is_capped() {
        let policy = RetryPolicy::new(u32::MAX, Duration::from_millis(1));
        match policy.should_retry(FailureType::Transient, 1000) {
            RetryDecision::Retry { delay } => {
                assert_eq!(delay, Duration::from_millis(1) * 2u32.pow(16));
            }
            RetryDecision::GiveUp => panic!("expected retry"),
        }
    }

    #[test]
    fn test_classify_status_table() {
        assert_eq!(classify_status(408), FailureType::Transient);
        assert_eq!(classify_status(429), FailureType::Transient);
        assert_eq!(classify_status(500), FailureType::Transient);
        assert_eq!(classify_status(503), FailureType::Transient);

        assert_eq!(classify_status(400), FailureType::Permanent);
        assert_eq!(classify_status(403), FailureType::Permanent);
        assert_eq!(classify_status(404), FailureType::Permanent);
        assert_eq!(classify_status(410), FailureType::Permanent);
    }
}

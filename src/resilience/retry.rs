//! Retry policy for the dispatcher.

use crate::config::RetryConfig;
use reqwest::StatusCode;
use std::io;
use std::time::Duration;

/// Attempt budget and server error backoff for one client.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base: Duration,
    step: Duration,
}

impl RetryPolicy {
    /// Creates a policy from configuration.
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: config.server_error_backoff,
            step: config.server_error_backoff_step,
        }
    }

    /// Total attempts per logical request.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if another attempt follows `attempt` (zero-based).
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }

    /// Sleep after a 500/502 on the zero-based `attempt`: `base + attempt * step`.
    pub fn server_error_backoff(&self, attempt: u32) -> Duration {
        self.base + self.step * attempt
    }

    /// Statuses retried unconditionally.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::INTERNAL_SERVER_ERROR | StatusCode::BAD_GATEWAY
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

/// Returns true if the error chain bottoms out in a reset or aborted connection.
pub fn is_transient_io(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted
            ) {
                return true;
            }
        }
        current = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();

        let schedule: Vec<u64> = (0..5)
            .map(|attempt| policy.server_error_backoff(attempt).as_secs())
            .collect();
        assert_eq!(schedule, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_attempt_budget() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 5);
        assert!(policy.has_next(3));
        assert!(!policy.has_next(4));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(RetryPolicy::is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(RetryPolicy::is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[derive(Debug)]
    struct Wrapper(io::Error);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "request failed")
        }
    }

    impl std::error::Error for Wrapper {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_transient_io_in_source_chain() {
        let reset = Wrapper(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(is_transient_io(&reset));

        let refused = Wrapper(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(!is_transient_io(&refused));
    }
}

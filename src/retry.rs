//! Caller-side retry strategy keyed on [`ErrorKind`].

use crate::error::{Error, ErrorKind};
use crate::models::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_INTERVAL};
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
        }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delays between attempts, one per retry.
    pub fn strategy(&self) -> impl Iterator<Item = Duration> {
        FixedInterval::new(self.interval).take(self.max_retries)
    }

    pub fn should_retry(&self, err: &Error) -> bool {
        match err.kind() {
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Auth => true,
            // 401/403 are retried once the caller has dropped the stale token.
            ErrorKind::Api => err.is_auth_rejection() || err.status().is_some_and(|s| s >= 500),
            ErrorKind::Validation | ErrorKind::Config => false,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_INTERVAL)
    }
}

use crate::client::error_classification::is_retryable;
use crate::config::ClientConfig;
use crate::Error;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Internal decision for how to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Internal policy engine for the client's attempt loop.
///
/// Fixed delay, bounded attempts, endpoints rotated in configuration order.
pub(crate) struct PolicyEngine {
    pub max_retries: u32,
    pub retry_delay: Duration,
    endpoint_count: usize,
}

impl PolicyEngine {
    pub fn new(config: &ClientConfig, endpoint_count: usize) -> Self {
        Self {
            max_retries: config.max_retry_attempts,
            retry_delay: config.retry_delay,
            endpoint_count: endpoint_count.max(1),
        }
    }

    /// Which configured endpoint serves `attempt` (0-based).
    pub fn endpoint_index(&self, attempt: u32) -> usize {
        attempt as usize % self.endpoint_count
    }

    /// Decide what to do next after an attempt failed.
    ///
    /// - `attempt` is 0-based (first failure => attempt=0).
    /// - caller cancellation always fails; a timeout counts as an ordinary failure.
    pub fn decide(&self, err: &Error, attempt: u32, cancel: &CancellationToken) -> Decision {
        if cancel.is_cancelled() || err.is_caller_cancellation() {
            return Decision::Fail;
        }
        if attempt >= self.max_retries {
            return Decision::Fail;
        }
        if !is_retryable(err) {
            return Decision::Fail;
        }
        Decision::Retry {
            delay: self.retry_delay,
        }
    }
}

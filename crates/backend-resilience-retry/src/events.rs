use backend_resilience_core::ClientEvent;
use std::time::{Duration, Instant};

/// Events emitted by the retry executor.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// An attempt failed and another one is about to be made.
    Retry {
        policy_name: String,
        timestamp: Instant,
        /// 1-based number of the attempt that failed.
        attempt: u32,
        delay: Duration,
    },
    /// The operation succeeded, on the first try or after retries.
    Success {
        policy_name: String,
        timestamp: Instant,
        attempts: u32,
    },
    /// The operation kept failing until `max_attempts` was reached.
    Exhausted {
        policy_name: String,
        timestamp: Instant,
        attempts: u32,
    },
    /// The operation failed with an error the predicate refused to retry.
    IgnoredError {
        policy_name: String,
        timestamp: Instant,
        attempt: u32,
    },
}

impl ClientEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Exhausted { .. } => "exhausted",
            RetryEvent::IgnoredError { .. } => "ignored_error",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            RetryEvent::Retry { policy_name, .. }
            | RetryEvent::Success { policy_name, .. }
            | RetryEvent::Exhausted { policy_name, .. }
            | RetryEvent::IgnoredError { policy_name, .. } => policy_name,
        }
    }
}

use crate::backoff::IntervalFunction;
use crate::events::RetryEvent;
use backend_resilience_core::EventListeners;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use metrics::counter;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Decides whether an error should be retried, given the 1-based number of
/// the attempt that produced it.
pub type RetryPredicate<E> = Arc<dyn Fn(&E, u32) -> bool + Send + Sync>;

/// Called before every retry with the error, the failed attempt number and
/// the delay about to be slept.
pub type RetryHook<E> = Arc<dyn Fn(&E, u32, Duration) + Send + Sync>;

/// A stateless, shareable retry policy.
///
/// Built with [`RetryPolicy::builder`] (errors decide their own
/// retryability through [`Retryable`](backend_resilience_errors::Retryable))
/// or [`RetryPolicyBuilder::new`](crate::RetryPolicyBuilder::new) (every error
/// is retried unless a predicate says otherwise).
pub struct RetryPolicy<E> {
    pub(crate) name: String,
    pub(crate) max_attempts: u32,
    pub(crate) interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) retry_predicate: Option<RetryPredicate<E>>,
    pub(crate) on_retry: Vec<RetryHook<E>>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            max_attempts: self.max_attempts,
            interval_fn: Arc::clone(&self.interval_fn),
            retry_predicate: self.retry_predicate.clone(),
            on_retry: self.on_retry.clone(),
            event_listeners: self.event_listeners.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("name", &self.name)
            .field("max_attempts", &self.max_attempts)
            .field("has_predicate", &self.retry_predicate.is_some())
            .field("on_retry", &self.on_retry.len())
            .finish()
    }
}

impl<E> RetryPolicy<E> {
    /// Name used in events, logs and metric labels.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if `error`, produced by `attempt`, may be retried.
    pub fn should_retry(&self, error: &E, attempt: u32) -> bool {
        match &self.retry_predicate {
            Some(predicate) => predicate(error, attempt),
            None => true,
        }
    }

    /// Delay to wait after `attempt` failed.
    pub fn next_backoff(&self, attempt: u32) -> Duration {
        self.interval_fn.next_interval(attempt)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or `max_attempts` attempts have been made.
    ///
    /// The first attempt runs immediately. On exhaustion the error of the last
    /// attempt is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use backend_resilience_retry::RetryPolicyBuilder;
    /// use std::time::Duration;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let policy = RetryPolicyBuilder::<String>::new()
    ///     .max_attempts(3)
    ///     .fixed_backoff(Duration::from_millis(1))
    ///     .build();
    ///
    /// let mut calls = 0;
    /// let result = policy
    ///     .execute(|| {
    ///         calls += 1;
    ///         let n = calls;
    ///         async move {
    ///             if n < 3 { Err(format!("attempt {n} failed")) } else { Ok(n) }
    ///         }
    ///     })
    ///     .await;
    ///
    /// assert_eq!(result, Ok(3));
    /// # }
    /// ```
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 1;

        loop {
            let error = match operation().await {
                Ok(value) => {
                    self.event_listeners.emit(&RetryEvent::Success {
                        policy_name: self.name.clone(),
                        timestamp: Instant::now(),
                        attempts: attempt,
                    });

                    #[cfg(feature = "metrics")]
                    counter!("retry_calls_total", "retry" => self.name.clone(), "result" => "success")
                        .increment(1);

                    return Ok(value);
                }
                Err(error) => error,
            };

            if !self.should_retry(&error, attempt) {
                self.event_listeners.emit(&RetryEvent::IgnoredError {
                    policy_name: self.name.clone(),
                    timestamp: Instant::now(),
                    attempt,
                });

                #[cfg(feature = "tracing")]
                debug!(retry = %self.name, attempt, "error is not retryable");

                #[cfg(feature = "metrics")]
                counter!("retry_calls_total", "retry" => self.name.clone(), "result" => "ignored")
                    .increment(1);

                return Err(error);
            }

            if attempt >= self.max_attempts {
                self.event_listeners.emit(&RetryEvent::Exhausted {
                    policy_name: self.name.clone(),
                    timestamp: Instant::now(),
                    attempts: attempt,
                });

                #[cfg(feature = "tracing")]
                warn!(retry = %self.name, attempts = attempt, "retry attempts exhausted");

                #[cfg(feature = "metrics")]
                counter!("retry_calls_total", "retry" => self.name.clone(), "result" => "exhausted")
                    .increment(1);

                return Err(error);
            }

            let delay = self.next_backoff(attempt);
            for hook in &self.on_retry {
                let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    hook(&error, attempt, delay)
                }));
            }
            drop(error);

            self.event_listeners.emit(&RetryEvent::Retry {
                policy_name: self.name.clone(),
                timestamp: Instant::now(),
                attempt,
                delay,
            });

            #[cfg(feature = "tracing")]
            debug!(
                retry = %self.name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "attempt failed, retrying"
            );

            #[cfg(feature = "metrics")]
            counter!("retry_attempts_total", "retry" => self.name.clone()).increment(1);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

/// Runs `operation` under `policy`.
///
/// Shorthand for [`RetryPolicy::execute`].
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy<E>, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    policy.execute(operation).await
}

use crate::backoff::{Backoff, BackoffStrategy, IntervalFunction, Jitter};
use crate::events::RetryEvent;
use crate::policy::{RetryHook, RetryPolicy, RetryPredicate};
use backend_resilience_core::{EventListeners, FnListener};
use backend_resilience_errors::Retryable;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::describe_counter;
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Default total number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
/// Default cap on any delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

fn describe_metrics() {
    #[cfg(feature = "metrics")]
    METRICS_INIT.call_once(|| {
        describe_counter!(
            "retry_calls_total",
            "Total number of executions by outcome (success, exhausted, ignored)"
        );
        describe_counter!(
            "retry_attempts_total",
            "Total number of retries made after a failed attempt"
        );
    });
}

impl<E> RetryPolicy<E>
where
    E: Retryable + 'static,
{
    /// Creates a builder whose default predicate asks the error itself
    /// through [`Retryable::is_retryable`].
    pub fn builder() -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::new().retry_on(|err: &E, _attempt| err.is_retryable())
    }
}

impl<E> Default for RetryPolicy<E>
where
    E: Retryable + 'static,
{
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`RetryPolicy`].
pub struct RetryPolicyBuilder<E> {
    name: String,
    max_attempts: u32,
    strategy: BackoffStrategy,
    base_delay: Duration,
    max_delay: Duration,
    jitter: Jitter,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    retry_predicate: Option<RetryPredicate<E>>,
    on_retry: Vec<RetryHook<E>>,
    event_listeners: EventListeners<RetryEvent>,
}

impl<E> Default for RetryPolicyBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryPolicyBuilder<E> {
    /// Creates a builder that retries every error.
    ///
    /// Defaults:
    /// - max_attempts: 3
    /// - strategy: exponential with full jitter
    /// - base_delay: 1000 ms
    /// - max_delay: 30000 ms
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        describe_metrics();
        Self {
            name: "<unnamed>".to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            strategy: BackoffStrategy::ExponentialJitter,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: Jitter::Full,
            interval_fn: None,
            retry_predicate: None,
            on_retry: Vec::new(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the total number of attempts, including the first one.
    ///
    /// Values below 1 are raised to 1.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the backoff strategy.
    pub fn strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the delay before the first retry.
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Sets the cap on any delay.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Sets the jitter range for [`BackoffStrategy::ExponentialJitter`].
    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Copies strategy, bounds and jitter from `backoff`.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.strategy = backoff.strategy();
        self.base_delay = backoff.base_delay();
        self.max_delay = backoff.max_delay();
        self.jitter = backoff.jitter();
        self
    }

    /// Retries immediately.
    pub fn no_backoff(self) -> Self {
        self.strategy(BackoffStrategy::None)
    }

    /// Waits `delay` before every retry.
    pub fn fixed_backoff(self, delay: Duration) -> Self {
        self.strategy(BackoffStrategy::Fixed).base_delay(delay)
    }

    /// Doubles the delay after every attempt, starting at `base_delay`.
    pub fn exponential_backoff(self, base_delay: Duration) -> Self {
        self.strategy(BackoffStrategy::Exponential)
            .base_delay(base_delay)
    }

    /// Uses a custom interval function instead of the built-in strategies.
    pub fn interval<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Sets the predicate deciding which errors are retried.
    ///
    /// The predicate receives the error and the 1-based attempt that
    /// produced it.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E, u32) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Sets the name used in events, logs and metric labels.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a hook invoked before every retry.
    ///
    /// # Callback Signature
    /// `Fn(&E, u32, Duration)`: the error, the 1-based attempt that failed,
    /// and the delay about to be slept.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(&E, u32, Duration) + Send + Sync + 'static,
    {
        self.on_retry.push(Arc::new(f));
        self
    }

    /// Registers a callback when an execution succeeds, with the number of
    /// attempts it took.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback when an execution runs out of attempts.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback when an error is not retried because the
    /// predicate rejected it.
    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::IgnoredError { attempt, .. } = event {
                f(*attempt);
            }
        }));
        self
    }

    /// Builds the policy.
    pub fn build(self) -> RetryPolicy<E> {
        let interval_fn = self.interval_fn.unwrap_or_else(|| {
            Arc::new(
                Backoff::new(self.strategy, self.base_delay, self.max_delay)
                    .with_jitter(self.jitter),
            )
        });

        RetryPolicy {
            name: self.name,
            max_attempts: self.max_attempts.max(1),
            interval_fn,
            retry_predicate: self.retry_predicate,
            on_retry: self.on_retry,
            event_listeners: self.event_listeners,
        }
    }
}

use rand::Rng;
use std::time::Duration;

/// Computes the delay before the next attempt.
///
/// `attempt` is the 1-based number of the attempt that just failed, so the
/// delay before the second attempt is `next_interval(1)`.
pub trait IntervalFunction: Send + Sync {
    /// Returns the delay to wait after `attempt` failed.
    fn next_interval(&self, attempt: u32) -> Duration;
}

/// How delays grow between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BackoffStrategy {
    /// Retry immediately.
    None,
    /// Wait `base_delay` every time.
    Fixed,
    /// Double the delay after every attempt.
    Exponential,
    /// Exponential ceiling with a random delay below it.
    #[default]
    ExponentialJitter,
}

/// Portion of the exponential ceiling that jitter may pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Jitter {
    /// Uniform in `[0, ceiling]`.
    #[default]
    Full,
    /// Uniform in `[ceiling / 2, ceiling]`.
    Half,
}

/// A backoff schedule: strategy, bounds and jitter.
///
/// # Examples
///
/// ```
/// use backend_resilience_retry::{Backoff, BackoffStrategy};
/// use std::time::Duration;
///
/// let backoff = Backoff::new(
///     BackoffStrategy::Exponential,
///     Duration::from_millis(100),
///     Duration::from_secs(1),
/// );
/// assert_eq!(backoff.delay(1), Duration::from_millis(100));
/// assert_eq!(backoff.delay(3), Duration::from_millis(400));
/// assert_eq!(backoff.delay(10), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    strategy: BackoffStrategy,
    base_delay: Duration,
    max_delay: Duration,
    jitter: Jitter,
}

impl Backoff {
    /// Creates a schedule. A base delay above `max_delay` is clamped to it.
    pub fn new(strategy: BackoffStrategy, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            strategy,
            base_delay: base_delay.min(max_delay),
            max_delay,
            jitter: Jitter::Full,
        }
    }

    /// Sets the jitter range used by [`BackoffStrategy::ExponentialJitter`].
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// The configured strategy.
    pub fn strategy(&self) -> BackoffStrategy {
        self.strategy
    }

    /// Delay used for the first retry.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Upper bound for every delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// The configured jitter range.
    pub fn jitter(&self) -> Jitter {
        self.jitter
    }

    /// Largest delay the schedule may return after `attempt` failed.
    pub fn ceiling(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::None => Duration::ZERO,
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Exponential | BackoffStrategy::ExponentialJitter => {
                let factor = 1u32
                    .checked_shl(attempt.saturating_sub(1))
                    .unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor).min(self.max_delay)
            }
        }
    }

    /// Delay to wait after `attempt` failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt);
        match self.strategy {
            BackoffStrategy::ExponentialJitter => jittered(ceiling, self.jitter),
            _ => ceiling,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            BackoffStrategy::ExponentialJitter,
            Duration::from_millis(1000),
            Duration::from_millis(30_000),
        )
    }
}

impl IntervalFunction for Backoff {
    fn next_interval(&self, attempt: u32) -> Duration {
        self.delay(attempt)
    }
}

fn jittered(ceiling: Duration, jitter: Jitter) -> Duration {
    let upper = u64::try_from(ceiling.as_nanos()).unwrap_or(u64::MAX);
    let lower = match jitter {
        Jitter::Full => 0,
        Jitter::Half => upper / 2,
    };
    let nanos = rand::rng().random_range(lower..=upper);
    Duration::from_nanos(nanos)
}

/// Function-based interval.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    /// Wraps `f`, which receives the 1-based failed attempt number.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn next_interval(&self, attempt: u32) -> Duration {
        (self.f)(attempt)
    }
}

//! Property tests for backoff schedules.
//!
//! Invariants tested:
//! - No delay exceeds the cap
//! - The exponential ceiling never shrinks as attempts grow
//! - Jittered delays stay within their band

use backend_resilience::retry::{Backoff, BackoffStrategy, Jitter};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: delays are capped and the exponential ceiling is monotonic
    #[test]
    fn exponential_ceiling_is_monotonic_and_capped(
        base_ms in 1u64..=5_000,
        extra_ms in 0u64..=60_000,
        attempt in 1u32..=64,
        jittered in any::<bool>(),
    ) {
        let strategy = if jittered {
            BackoffStrategy::ExponentialJitter
        } else {
            BackoffStrategy::Exponential
        };
        let max = Duration::from_millis(base_ms + extra_ms);
        let backoff = Backoff::new(strategy, Duration::from_millis(base_ms), max);

        prop_assert!(backoff.delay(attempt) <= max);
        prop_assert!(backoff.delay(attempt + 1) <= max);
        prop_assert!(backoff.ceiling(attempt + 1) >= backoff.ceiling(attempt));
        if !jittered {
            prop_assert_eq!(backoff.delay(attempt), backoff.ceiling(attempt));
        }
    }

    /// Property: half jitter never drops below half the ceiling
    #[test]
    fn half_jitter_stays_in_upper_band(
        base_ms in 1u64..=1_000,
        attempt in 1u32..=20,
    ) {
        let backoff = Backoff::new(
            BackoffStrategy::ExponentialJitter,
            Duration::from_millis(base_ms),
            Duration::from_secs(30),
        )
        .with_jitter(Jitter::Half);

        let ceiling = backoff.ceiling(attempt);
        let delay = backoff.delay(attempt);
        prop_assert!(delay <= ceiling);
        prop_assert!(delay >= ceiling / 2);
    }

    /// Property: fixed backoff ignores the attempt number
    #[test]
    fn fixed_backoff_is_constant(base_ms in 0u64..=10_000, attempt in 1u32..=100) {
        let base = Duration::from_millis(base_ms);
        let backoff = Backoff::new(BackoffStrategy::Fixed, base, Duration::from_secs(10));
        prop_assert_eq!(backoff.delay(attempt), base);
    }
}

//! Property tests for the connection pool.
//!
//! Invariants tested:
//! - `idle + active` never exceeds `max_connections`
//! - An eviction cycle with nothing borrowed leaves at least
//!   `min_connections` open
//! - A connection is never lent to two holders at once

use super::paused_runtime;
use backend_resilience::errors::ClassifiedError;
use backend_resilience::pool::{ConnectionFactory, ConnectionPool, Lease, PoolConfig, PoolError};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Default)]
struct Serials(AtomicU64);

impl ConnectionFactory for Serials {
    type Connection = u64;

    async fn connect(&self) -> Result<u64, ClassifiedError> {
        Ok(self.0.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Debug, Clone)]
enum Op {
    Acquire,
    Release(usize),
    Idle(u64),
    Evict,
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            4 => Just(Op::Acquire),
            3 => (0usize..8).prop_map(Op::Release),
            1 => (1u64..120).prop_map(Op::Idle),
            1 => Just(Op::Evict),
        ],
        1..60,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: pool occupancy stays within bounds under any operation sequence
    #[test]
    fn pool_stays_within_bounds(min in 0usize..=3, extra in 0usize..=4, ops in ops()) {
        let max = min + extra.max(1);
        let config = PoolConfig::builder()
            .min_connections(min)
            .max_connections(max)
            .idle_timeout(Duration::from_secs(30))
            .max_connection_age(Duration::from_secs(90))
            .build();

        paused_runtime().block_on(async {
            let pool = ConnectionPool::new(Serials::default(), config).await.unwrap();
            let mut held: Vec<Lease<Serials>> = Vec::new();

            for op in ops {
                match op {
                    Op::Acquire => match pool.acquire().await {
                        Ok(lease) => {
                            let lent: HashSet<u64> = held.iter().map(|l| **l).collect();
                            prop_assert!(!lent.contains(&*lease), "connection {} lent twice", *lease);
                            held.push(lease);
                        }
                        Err(PoolError::Exhausted { .. }) => prop_assert_eq!(held.len(), max),
                        Err(other) => prop_assert!(false, "unexpected error: {}", other),
                    },
                    Op::Release(index) => {
                        if !held.is_empty() {
                            let lease = held.remove(index % held.len());
                            prop_assert!(pool.release(lease));
                        }
                    }
                    Op::Idle(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                    Op::Evict => {
                        pool.evict_expired().await;
                        if held.is_empty() {
                            prop_assert!(pool.size() >= min, "size {} < min {}", pool.size(), min);
                        }
                    }
                }

                let stats = pool.stats();
                prop_assert!(stats.idle + stats.active <= max, "{:?}", stats);
                prop_assert_eq!(stats.active, held.len());
            }
            Ok(())
        })?;
    }
}

use super::common::TestFactory;
use backend_resilience::pool::{ConnectionPool, PoolConfig, PoolError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn sized(min: usize, max: usize) -> PoolConfig {
    PoolConfig::builder()
        .name("scenario")
        .min_connections(min)
        .max_connections(max)
        .build()
}

#[tokio::test]
async fn exhaustion_then_recovery_reuses_the_same_connection() {
    let pool = ConnectionPool::new(TestFactory::default(), sized(1, 1))
        .await
        .unwrap();

    let first = pool.acquire().await.unwrap();
    let first_id = first.id();

    let err = pool.acquire().await.unwrap_err();
    assert!(matches!(err, PoolError::Exhausted { max_connections: 1 }));

    assert!(pool.release(first));
    let again = pool.acquire().await.unwrap();
    assert_eq!(again.id(), first_id);
    assert_eq!(pool.factory().opened(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_acquires_never_share_a_connection() {
    const MAX: usize = 4;
    let pool = ConnectionPool::new(TestFactory::default(), sized(1, MAX))
        .await
        .unwrap();
    let in_use = Arc::new(Mutex::new(HashSet::new()));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let pool = pool.clone();
        let in_use = Arc::clone(&in_use);
        tasks.push(tokio::spawn(async move {
            let mut served = 0;
            while served < 25 {
                let lease = match pool.acquire().await {
                    Ok(lease) => lease,
                    Err(PoolError::Exhausted { .. }) => {
                        tokio::task::yield_now().await;
                        continue;
                    }
                    Err(other) => panic!("unexpected pool error: {other}"),
                };

                assert!(
                    in_use.lock().unwrap().insert(lease.serial),
                    "session {} lent out twice",
                    lease.serial
                );
                let stats = pool.stats();
                assert!(stats.idle + stats.active <= MAX, "{stats:?}");

                tokio::task::yield_now().await;

                in_use.lock().unwrap().remove(&lease.serial);
                drop(lease);
                served += 1;
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.active, 0);
    assert!(stats.total <= MAX);
    assert!(pool.factory().opened() <= MAX);
}

#[tokio::test(start_paused = true)]
async fn eviction_shrinks_idle_pool_back_to_minimum() {
    let config = PoolConfig::builder()
        .min_connections(2)
        .max_connections(5)
        .idle_timeout(Duration::from_secs(30))
        .build();
    let pool = ConnectionPool::new(TestFactory::default(), config)
        .await
        .unwrap();

    let mut leases = Vec::new();
    for _ in 0..5 {
        leases.push(pool.acquire().await.unwrap());
    }
    assert_eq!(pool.size(), 5);
    drop(leases);
    assert_eq!(pool.idle_count(), 5);

    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(pool.active_count(), 0);
    assert!(pool.size() >= 2, "size {}", pool.size());
    assert!(pool.size() <= 5);
    assert!(pool.factory().state.closed.load(std::sync::atomic::Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn connect_failures_do_not_leak_capacity() {
    let factory = TestFactory::default();
    let pool = ConnectionPool::new(factory.clone(), sized(0, 1))
        .await
        .unwrap();

    factory.set_offline(true);
    for _ in 0..3 {
        assert!(matches!(
            pool.acquire().await,
            Err(PoolError::Connect(_))
        ));
    }

    factory.set_offline(false);
    let lease = pool.acquire().await.unwrap();
    assert_eq!(lease.serial, 0);
}

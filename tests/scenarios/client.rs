use super::common::{init_tracing, network_error, wait_for_status, TestFactory};
use backend_resilience::errors::{BackendFailure, ErrorCategory, TransportFailure, TransportKind};
use backend_resilience::health::MonitorConfig;
use backend_resilience::pool::{PoolConfig, POOL_EXHAUSTED};
use backend_resilience::retry::BackoffStrategy;
use backend_resilience::{ClientConfig, ConnectionStatus, ResilientClient, RetryConfig};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn config() -> ClientConfig {
    ClientConfig::builder()
        .name("orders")
        .pool(
            PoolConfig::builder()
                .min_connections(1)
                .max_connections(1)
                .build(),
        )
        .retry(RetryConfig {
            max_attempts: 3,
            strategy: BackoffStrategy::Fixed,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(10),
        })
        .monitor(
            MonitorConfig::builder()
                .health_check_interval(Duration::from_secs(5))
                .reconnect_backoff(Duration::from_millis(100), Duration::from_secs(1))
                .build(),
        )
        .build()
}

async fn client(factory: TestFactory) -> ResilientClient<TestFactory> {
    init_tracing();
    ResilientClient::builder()
        .config(config())
        .factory(factory)
        .probe(|| async { true })
        .build()
        .await
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_surface_the_network_error() {
    let client = client(TestFactory::default()).await;
    let calls = AtomicUsize::new(0);

    let err = client
        .execute(|_session| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(network_error()) }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(err.category(), ErrorCategory::Network);
    assert_eq!(err.message(), "upstream connection reset");
    assert_eq!(client.pool_stats().active, 0);
}

#[tokio::test(start_paused = true)]
async fn validation_failures_are_not_retried() {
    let client = client(TestFactory::default()).await;
    let calls = AtomicUsize::new(0);

    let err = client
        .execute(|_session| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<(), _>(
                    BackendFailure::new("invalid input syntax for type uuid").code("22P02"),
                )
            }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert_eq!(err.code(), Some("22P02"));
}

#[tokio::test(start_paused = true)]
async fn transport_timeouts_are_retried_until_success() {
    let client = client(TestFactory::default()).await;
    let calls = AtomicUsize::new(0);

    let serial = client
        .execute(|session| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(TransportFailure::new(TransportKind::Timeout))
                } else {
                    Ok(session.serial)
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(serial, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn busy_pool_rejects_then_recovers() {
    let client = client(TestFactory::default()).await;
    let held = client.pool().acquire().await.unwrap();

    let err = client
        .execute(|_session| async { Ok::<_, std::io::Error>(()) })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(POOL_EXHAUSTED));
    assert!(!err.is_retryable());

    let held_serial = held.serial;
    drop(held);
    let serial = client
        .execute(|session| async move { Ok::<_, std::io::Error>(session.serial) })
        .await
        .unwrap();
    assert_eq!(serial, held_serial);
}

#[tokio::test]
async fn unreachable_backend_is_classified_as_network() {
    let factory = TestFactory::default();
    factory.set_offline(true);
    let client = client(factory.clone()).await;

    let err = client
        .execute(|_session| async { Ok::<_, std::io::Error>(()) })
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Network);

    factory.set_offline(false);
    assert!(client
        .execute(|_session| async { Ok::<_, std::io::Error>(()) })
        .await
        .is_ok());
}

#[tokio::test(start_paused = true)]
async fn status_follows_the_probe() {
    let healthy = Arc::new(AtomicBool::new(true));
    let probe_flag = Arc::clone(&healthy);
    let client = ResilientClient::builder()
        .config(config())
        .factory(TestFactory::default())
        .probe(move || {
            let ok = probe_flag.load(Ordering::SeqCst);
            async move { ok }
        })
        .build()
        .await
        .unwrap();

    wait_for_status(client.monitor(), ConnectionStatus::Connected).await;

    healthy.store(false, Ordering::SeqCst);
    wait_for_status(client.monitor(), ConnectionStatus::Reconnecting).await;

    healthy.store(true, Ordering::SeqCst);
    wait_for_status(client.monitor(), ConnectionStatus::Connected).await;
    assert_eq!(client.monitor().reconnect_attempts(), 0);

    let statuses: Vec<_> = client
        .connection_log()
        .iter()
        .map(|entry| entry.status)
        .collect();
    assert!(statuses.contains(&ConnectionStatus::Error));

    client.shutdown().await;
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn default_check_notices_an_offline_backend() {
    init_tracing();
    let factory = TestFactory::default();
    let client = ResilientClient::builder()
        .config(config())
        .factory(factory.clone())
        .build()
        .await
        .unwrap();

    wait_for_status(client.monitor(), ConnectionStatus::Connected).await;
    // The idle pooled session stays behind; only the check sees the outage.
    assert_eq!(client.pool_stats().idle, 1);

    factory.set_offline(true);
    client.monitor().probe_now();
    wait_for_status(client.monitor(), ConnectionStatus::Error).await;

    factory.set_offline(false);
    wait_for_status(client.monitor(), ConnectionStatus::Connected).await;
    assert!(factory.state.closed.load(Ordering::SeqCst) >= 2);
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_reconnect_attempts() {
    init_tracing();
    let factory = TestFactory::default();
    factory.set_offline(true);

    let mut config = config();
    config.monitor = MonitorConfig::builder()
        .health_check_interval(Duration::from_secs(5))
        .max_reconnect_attempts(2)
        .reconnect_backoff(Duration::from_millis(100), Duration::from_secs(1))
        .build();

    let exhausted = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&exhausted);
    let client = ResilientClient::builder()
        .config(config)
        .factory(factory)
        .on_reconnect_exhausted(move |attempts| seen.store(attempts, Ordering::SeqCst))
        .build()
        .await
        .unwrap();

    let gave_up = tokio::time::timeout(Duration::from_secs(60), async {
        while exhausted.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await;

    assert!(gave_up.is_ok());
    assert_eq!(exhausted.load(Ordering::SeqCst), 2);
    assert_eq!(client.status(), ConnectionStatus::Error);
}

#[tokio::test]
async fn reset_leaves_in_flight_sessions_open() {
    let factory = TestFactory::default();
    let client = client(factory.clone()).await;
    let held = client.pool().acquire().await.unwrap();

    client.reset().await.unwrap();
    assert_eq!(factory.state.closed.load(Ordering::SeqCst), 0);

    // The single slot is still taken by the retired session.
    let err = client
        .execute(|_session| async { Ok::<_, std::io::Error>(()) })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(POOL_EXHAUSTED));

    drop(held);
    let serial = client
        .execute(|session| async move { Ok::<_, std::io::Error>(session.serial) })
        .await
        .unwrap();
    assert_eq!(serial, 1);

    for _ in 0..10 {
        if factory.state.closed.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(factory.state.closed.load(Ordering::SeqCst), 1);
}

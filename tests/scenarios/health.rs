use super::common::wait_for_status;
use backend_resilience::health::{
    ConnectionStatus, HealthMonitor, LogEntry, MonitorConfig, CONNECTION_LOG_CAPACITY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Probe that answers from a fixed script, then repeats the last answer.
fn scripted(script: Vec<bool>) -> impl Fn() -> std::future::Ready<bool> + Send + Sync + 'static {
    let calls = AtomicUsize::new(0);
    move || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        let healthy = script.get(n).or(script.last()).copied().unwrap_or(true);
        std::future::ready(healthy)
    }
}

fn config() -> MonitorConfig {
    MonitorConfig::builder()
        .name("scenario")
        .health_check_interval(Duration::from_secs(5))
        .max_reconnect_attempts(5)
        .reconnect_backoff(Duration::from_millis(200), Duration::from_secs(2))
        .build()
}

/// Every consecutive pair of log entries must be a legal edge, except the
/// repeated `RECONNECTING` entries that record further attempts.
fn assert_legal(log: &[LogEntry]) {
    for pair in log.windows(2) {
        let (previous, next) = (pair[0].status, pair[1].status);
        let repeated_attempt =
            previous == ConnectionStatus::Reconnecting && next == ConnectionStatus::Reconnecting;
        assert!(
            repeated_attempt || previous.can_transition_to(next),
            "illegal transition {previous} -> {next} ({})",
            pair[1].details
        );
    }
}

#[tokio::test(start_paused = true)]
async fn reconnects_after_two_failed_probes() {
    let monitor = HealthMonitor::start(scripted(vec![false, false, true]), config()).unwrap();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    let _subscription = monitor.on_status_change(move |status| sink.lock().unwrap().push(status));

    wait_for_status(&monitor, ConnectionStatus::Connected).await;

    let logged: Vec<_> = monitor
        .connection_log()
        .iter()
        .map(|entry| entry.status)
        .collect();
    assert_eq!(
        logged,
        vec![
            ConnectionStatus::Connecting,
            ConnectionStatus::Error,
            ConnectionStatus::Reconnecting,
            ConnectionStatus::Reconnecting,
            ConnectionStatus::Connected,
        ]
    );
    assert_eq!(monitor.reconnect_attempts(), 0);

    // Subscribers hear each change once; the repeated attempt is log-only.
    assert_eq!(
        *observed.lock().unwrap(),
        vec![
            ConnectionStatus::Disconnected,
            ConnectionStatus::Connecting,
            ConnectionStatus::Error,
            ConnectionStatus::Reconnecting,
            ConnectionStatus::Connected,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn recorded_transitions_are_always_legal() {
    let script = vec![
        true, false, false, true, true, false, true, false, false, false, false, false, false,
    ];
    let monitor = HealthMonitor::start(scripted(script), config()).unwrap();

    // Long enough to run the whole script and exhaust reconnection.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(monitor.status(), ConnectionStatus::Error);

    monitor.reset();
    tokio::time::sleep(Duration::from_secs(30)).await;
    monitor.shutdown().await;

    let log = monitor.connection_log();
    assert_eq!(log[0].status, ConnectionStatus::Connecting);
    assert_eq!(
        log.last().map(|entry| entry.status),
        Some(ConnectionStatus::Disconnected)
    );
    assert_legal(&log);
}

#[tokio::test(start_paused = true)]
async fn connection_log_is_bounded() {
    // Alternate so every probe changes status.
    let flips = AtomicUsize::new(0);
    let probe = move || {
        let n = flips.fetch_add(1, Ordering::SeqCst);
        std::future::ready(n % 2 == 0)
    };
    let monitor = HealthMonitor::start(
        probe,
        MonitorConfig::builder()
            .health_check_interval(Duration::from_secs(1))
            .reconnect_backoff(Duration::from_millis(10), Duration::from_millis(10))
            .build(),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_secs(600)).await;

    let log = monitor.connection_log();
    assert_eq!(log.len(), CONNECTION_LOG_CAPACITY);
    assert_legal(&log);
    assert!(log.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
}

#[tokio::test(start_paused = true)]
async fn status_stream_works_with_stream_combinators() {
    use futures::StreamExt;

    let monitor = HealthMonitor::start(scripted(vec![true]), config()).unwrap();
    let statuses: Vec<_> = monitor
        .subscribe()
        .skip_while(|status| std::future::ready(*status == ConnectionStatus::Disconnected))
        .take(2)
        .collect()
        .await;

    assert_eq!(
        statuses,
        vec![ConnectionStatus::Connecting, ConnectionStatus::Connected]
    );
    monitor.shutdown().await;
}

//! Health monitor metrics regression tests

use super::helpers::*;
use backend_resilience::health::{ConnectionStatus, HealthMonitor, MonitorConfig};
use serial_test::serial;
use std::time::Duration;

#[tokio::test(start_paused = true)]
#[serial]
async fn health_metrics_exist() {
    init_recorder();

    let config = MonitorConfig::builder()
        .name("test_monitor")
        .health_check_interval(Duration::from_secs(1))
        .build();
    let monitor = HealthMonitor::start(|| async { true }, config).unwrap();

    let mut statuses = monitor.subscribe();
    while let Some(status) = statuses.recv().await {
        if status == ConnectionStatus::Connected {
            break;
        }
    }
    monitor.shutdown().await;

    assert_counter_exists("health_status_transitions_total");
    assert_metric_has_label("health_status_transitions_total", "monitor", "test_monitor");
    assert_metric_has_label("health_status_transitions_total", "from", "CONNECTING");
    assert_metric_has_label("health_status_transitions_total", "to", "CONNECTED");

    assert_gauge_exists("health_status");
    assert_metric_has_label("health_status", "monitor", "test_monitor");

    assert_counter_exists("health_probes_total");
    assert_metric_has_label("health_probes_total", "result", "healthy");
}

#[tokio::test(start_paused = true)]
#[serial]
async fn reconnect_metrics_exist() {
    init_recorder();

    let config = MonitorConfig::builder()
        .name("failing_monitor")
        .max_reconnect_attempts(1)
        .reconnect_backoff(Duration::from_millis(10), Duration::from_millis(10))
        .build();
    let monitor = HealthMonitor::start(|| async { false }, config).unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    monitor.shutdown().await;

    assert_metric_has_label("health_probes_total", "result", "unhealthy");
    assert_counter_exists("health_reconnect_attempts_total");
    assert_metric_has_label("health_reconnect_attempts_total", "monitor", "failing_monitor");
}

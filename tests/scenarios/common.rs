use backend_resilience::errors::{ClassifiedError, ErrorCategory};
use backend_resilience::health::{ConnectionStatus, HealthMonitor};
use backend_resilience::pool::ConnectionFactory;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A backend session handed out by [`TestFactory`].
#[derive(Debug)]
pub struct Session {
    pub serial: u64,
}

#[derive(Debug, Default)]
pub struct FactoryState {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub offline: AtomicBool,
    next_serial: AtomicU64,
}

/// Factory whose sessions get increasing serial numbers.
#[derive(Debug, Clone, Default)]
pub struct TestFactory {
    pub state: Arc<FactoryState>,
}

impl TestFactory {
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.offline.store(offline, Ordering::SeqCst);
    }
}

impl ConnectionFactory for TestFactory {
    type Connection = Session;

    async fn connect(&self) -> Result<Session, ClassifiedError> {
        if self.state.offline.load(Ordering::SeqCst) {
            return Err(ClassifiedError::new(
                ErrorCategory::Network,
                "connection refused",
            ));
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Session {
            serial: self.state.next_serial.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn close(&self, _conn: &Session) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Waits (on the paused clock) until `monitor` reports `target`.
pub async fn wait_for_status(monitor: &HealthMonitor, target: ConnectionStatus) {
    let mut statuses = monitor.subscribe();
    let reached = tokio::time::timeout(Duration::from_secs(24 * 3600), async {
        while let Some(status) = statuses.recv().await {
            if status == target {
                return true;
            }
        }
        false
    })
    .await;
    assert_eq!(reached, Ok(true), "monitor never reached {target}");
}

pub fn network_error() -> ClassifiedError {
    ClassifiedError::new(ErrorCategory::Network, "upstream connection reset")
}

/// Routes library tracing output through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

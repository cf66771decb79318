use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::events::MonitorEvent;
use crate::log::{ConnectionLog, LogEntry};
use crate::probe::HealthProbe;
use crate::status::ConnectionStatus;
use crate::subscribers::{StatusStream, Subscribers, Unsubscribe};
use backend_resilience_core::EventListeners;
use backend_resilience_retry::{Backoff, BackoffStrategy, Jitter};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, gauge};

#[cfg(feature = "metrics")]
static METRICS_INIT: std::sync::Once = std::sync::Once::new();

#[cfg(feature = "metrics")]
fn describe_metrics() {
    METRICS_INIT.call_once(|| {
        describe_counter!(
            "health_status_transitions_total",
            "Connection status transitions, labelled by source and target status"
        );
        describe_gauge!(
            "health_status",
            "Current connection status (0=disconnected, 1=connecting, 2=connected, 3=degraded, 4=error, 5=reconnecting)"
        );
        describe_counter!("health_probes_total", "Health probes by result");
        describe_counter!(
            "health_reconnect_attempts_total",
            "Reconnect probes scheduled by the monitor"
        );
    });
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy)]
enum Command {
    ProbeNow,
    Reset,
    Stop,
}

/// What the loop does after a probe.
enum Wait {
    For(Duration),
    Idle,
}

struct Shared {
    config: MonitorConfig,
    status: AtomicU8,
    reconnect_attempts: AtomicU32,
    log: Mutex<ConnectionLog>,
    subscribers: Arc<Mutex<Subscribers>>,
    listeners: EventListeners<MonitorEvent>,
    commands: mpsc::UnboundedSender<Command>,
    backoff: Backoff,
}

impl Shared {
    fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Moves to `to`, recording and broadcasting the change. Same-status
    /// moves are ignored.
    fn transition(&self, to: ConnectionStatus, details: impl Into<String>) {
        let from = self.status();
        if from == to {
            return;
        }
        debug_assert!(
            from.can_transition_to(to),
            "illegal transition {from} -> {to}"
        );
        let details = details.into();

        {
            let mut subscribers = lock(&self.subscribers);
            self.status.store(to.into(), Ordering::Release);
            lock(&self.log).push(to, details.as_str());
            subscribers.notify(to);
        }

        #[cfg(feature = "tracing")]
        {
            if self.config.enable_logging && to == ConnectionStatus::Error {
                tracing::warn!(monitor = %self.config.name, %from, %to, details = %details, "connection status changed");
            } else if self.config.enable_logging {
                tracing::info!(monitor = %self.config.name, %from, %to, details = %details, "connection status changed");
            }
        }

        #[cfg(feature = "metrics")]
        {
            counter!(
                "health_status_transitions_total",
                "monitor" => self.config.name.clone(),
                "from" => from.label(),
                "to" => to.label()
            )
            .increment(1);
            gauge!("health_status", "monitor" => self.config.name.clone())
                .set(f64::from(u8::from(to)));
        }

        self.listeners.emit(&MonitorEvent::StatusChanged {
            monitor_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            from,
            to,
        });
    }

    async fn probe<P: HealthProbe>(&self, probe: &P) -> Wait {
        let started = tokio::time::Instant::now();
        let check = AssertUnwindSafe(async { probe.check().await }).catch_unwind();
        let outcome = tokio::time::timeout(self.config.probe_timeout, check).await;
        let latency = started.elapsed();
        let healthy = matches!(outcome, Ok(Ok(true)));

        #[cfg(feature = "metrics")]
        counter!(
            "health_probes_total",
            "monitor" => self.config.name.clone(),
            "result" => if healthy { "healthy" } else { "unhealthy" }
        )
        .increment(1);

        #[cfg(feature = "tracing")]
        tracing::debug!(monitor = %self.config.name, healthy, ?latency, "probe completed");

        self.listeners.emit(&MonitorEvent::ProbeCompleted {
            monitor_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            healthy,
            latency,
        });

        match outcome {
            Ok(Ok(true)) => self.on_healthy(latency),
            Ok(Ok(false)) => self.on_unhealthy("probe failed"),
            Ok(Err(_)) => self.on_unhealthy("probe panicked"),
            Err(_) => self.on_unhealthy(&format!(
                "probe timed out after {:?}",
                self.config.probe_timeout
            )),
        }
    }

    fn on_healthy(&self, latency: Duration) -> Wait {
        let attempts = self.reconnect_attempts.swap(0, Ordering::AcqRel);
        let degraded = self
            .config
            .degraded_latency
            .is_some_and(|threshold| latency > threshold);

        if degraded {
            self.transition(
                ConnectionStatus::Degraded,
                format!("probe took {latency:?}"),
            );
        } else if attempts > 0 {
            self.transition(
                ConnectionStatus::Connected,
                format!("reconnected after {attempts} attempt(s)"),
            );
        } else {
            self.transition(ConnectionStatus::Connected, "probe succeeded");
        }
        Wait::For(self.config.health_check_interval)
    }

    fn on_unhealthy(&self, reason: &str) -> Wait {
        if self.status() != ConnectionStatus::Reconnecting {
            self.transition(ConnectionStatus::Error, reason);
            if !self.config.auto_reconnect || self.config.max_reconnect_attempts == 0 {
                return Wait::Idle;
            }
            return self.schedule_reconnect(1);
        }

        let attempts = self.reconnect_attempts.load(Ordering::Acquire);
        if attempts >= self.config.max_reconnect_attempts {
            self.transition(
                ConnectionStatus::Error,
                format!("{reason}; gave up after {attempts} reconnect attempt(s)"),
            );
            self.listeners.emit(&MonitorEvent::ReconnectExhausted {
                monitor_name: self.config.name.clone(),
                timestamp: std::time::Instant::now(),
                attempts,
            });
            return Wait::Idle;
        }
        self.schedule_reconnect(attempts + 1)
    }

    fn schedule_reconnect(&self, attempt: u32) -> Wait {
        self.reconnect_attempts.store(attempt, Ordering::Release);
        let delay = self.backoff.delay(attempt);
        let details = format!(
            "reconnect attempt {attempt} of {} in {delay:?}",
            self.config.max_reconnect_attempts
        );

        if self.status() == ConnectionStatus::Reconnecting {
            // Repeated attempts are logged without a status broadcast.
            lock(&self.log).push(ConnectionStatus::Reconnecting, details);
        } else {
            self.transition(ConnectionStatus::Reconnecting, details);
        }

        #[cfg(feature = "metrics")]
        counter!("health_reconnect_attempts_total", "monitor" => self.config.name.clone())
            .increment(1);

        self.listeners.emit(&MonitorEvent::ReconnectScheduled {
            monitor_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            attempt,
            delay,
        });
        Wait::For(delay)
    }

    fn restart(&self) {
        self.reconnect_attempts.store(0, Ordering::Release);
        self.transition(ConnectionStatus::Disconnected, "reset requested");
        self.transition(ConnectionStatus::Connecting, "monitor restarted");
    }

    /// Leaves the parked `Error` status for a manual reconnect cycle.
    fn manual_reconnect(&self) {
        self.reconnect_attempts.store(1, Ordering::Release);
        self.transition(ConnectionStatus::Reconnecting, "manual probe requested");
    }
}

/// Single writer of the monitor state.
async fn run<P: HealthProbe>(
    shared: Arc<Shared>,
    probe: P,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    shared.transition(ConnectionStatus::Connecting, "monitor started");

    loop {
        let wait = shared.probe(&probe).await;

        let command = match wait {
            Wait::For(delay) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => None,
                    command = commands.recv() => Some(command.unwrap_or(Command::Stop)),
                }
            }
            Wait::Idle => Some(commands.recv().await.unwrap_or(Command::Stop)),
        };

        match command {
            None => {}
            Some(Command::ProbeNow) => {
                if shared.status() == ConnectionStatus::Error {
                    shared.manual_reconnect();
                }
            }
            Some(Command::Reset) => shared.restart(),
            Some(Command::Stop) => {
                shared.transition(ConnectionStatus::Disconnected, "monitor stopped");
                break;
            }
        }
    }
}

struct TaskGuard {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
    }
}

/// Tracks backend connectivity with periodic probes and reconnects with
/// backoff after failures.
///
/// The monitor runs on a background task that owns every status change;
/// readers see the latest status through [`status`](Self::status) and
/// observers are notified in transition order. Cloning shares the same
/// monitor. The task is aborted when the last clone is dropped.
///
/// # Status flow
///
/// ```text
/// DISCONNECTED -> CONNECTING -> CONNECTED <-> DEGRADED
///                     |             |            |
///                     +-----> ERROR <------------+
///                               |  ^
///                               v  |
///                          RECONNECTING -> CONNECTED
/// ```
///
/// Every status can return to `DISCONNECTED` on [`reset`](Self::reset) or
/// [`shutdown`](Self::shutdown).
///
/// # Examples
///
/// ```
/// use backend_resilience_health::{ConnectionStatus, HealthMonitor, MonitorConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let monitor = HealthMonitor::start(|| async { true }, MonitorConfig::default()).unwrap();
///
/// let mut statuses = monitor.subscribe();
/// while let Some(status) = statuses.recv().await {
///     if status == ConnectionStatus::Connected {
///         break;
///     }
/// }
/// monitor.shutdown().await;
/// assert_eq!(monitor.status(), ConnectionStatus::Disconnected);
/// # }
/// ```
#[derive(Clone)]
pub struct HealthMonitor {
    shared: Arc<Shared>,
    guard: Arc<TaskGuard>,
}

impl HealthMonitor {
    /// Validates `config` and starts monitoring with `probe`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn start<P: HealthProbe>(probe: P, config: MonitorConfig) -> Result<Self, MonitorError> {
        Self::start_with_listeners(probe, config, EventListeners::new())
    }

    /// Like [`start`](Self::start), reporting [`MonitorEvent`]s to `listeners`.
    pub fn start_with_listeners<P: HealthProbe>(
        probe: P,
        config: MonitorConfig,
        listeners: EventListeners<MonitorEvent>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;

        #[cfg(feature = "metrics")]
        describe_metrics();

        let backoff = Backoff::new(
            BackoffStrategy::ExponentialJitter,
            config.reconnect_base_delay,
            config.reconnect_max_delay,
        )
        .with_jitter(Jitter::Half);
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            config,
            status: AtomicU8::new(ConnectionStatus::Disconnected.into()),
            reconnect_attempts: AtomicU32::new(0),
            log: Mutex::new(ConnectionLog::new()),
            subscribers: Arc::new(Mutex::new(Subscribers::default())),
            listeners,
            commands: tx,
            backoff,
        });

        let task = tokio::spawn(run(Arc::clone(&shared), probe, rx));

        Ok(Self {
            shared,
            guard: Arc::new(TaskGuard {
                task: Mutex::new(Some(task)),
            }),
        })
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    /// Reconnect probes made in the current cycle; 0 once connected.
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.reconnect_attempts.load(Ordering::Acquire)
    }

    /// Registers a callback for status changes.
    ///
    /// The callback runs immediately with the current status, then once per
    /// transition, in order. It runs on the monitor task and should return
    /// quickly.
    pub fn on_status_change<F>(&self, callback: F) -> Unsubscribe
    where
        F: FnMut(ConnectionStatus) + Send + 'static,
    {
        let mut subscribers = lock(&self.shared.subscribers);
        let id = subscribers.add_callback(self.status(), Box::new(callback));
        Unsubscribe::new(Arc::downgrade(&self.shared.subscribers), id)
    }

    /// Returns a stream of statuses starting with the current one.
    pub fn subscribe(&self) -> StatusStream {
        let mut subscribers = lock(&self.shared.subscribers);
        subscribers.add_stream(self.status())
    }

    /// Number of live observers.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.subscribers).len()
    }

    /// The most recent status changes and reconnect attempts, oldest first.
    pub fn connection_log(&self) -> Vec<LogEntry> {
        lock(&self.shared.log).entries()
    }

    /// Probes without waiting for the next scheduled check.
    ///
    /// After reconnection has given up this starts a fresh reconnect cycle.
    pub fn probe_now(&self) {
        self.send(Command::ProbeNow);
    }

    /// Returns to `Disconnected`, clears the reconnect counter and starts
    /// probing again.
    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    /// Stops the monitor and waits for the background task to finish.
    ///
    /// The final status is `Disconnected`. Later calls are no-ops.
    pub async fn shutdown(&self) {
        self.send(Command::Stop);
        let task = lock(&self.guard.task).take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Whether the background task is still running.
    pub fn is_running(&self) -> bool {
        lock(&self.guard.task)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    fn send(&self, command: Command) {
        if self.shared.commands.send(command).is_err() {
            #[cfg(feature = "tracing")]
            tracing::debug!(monitor = %self.shared.config.name, ?command, "monitor is not running");
        }
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("name", &self.shared.config.name)
            .field("status", &self.status())
            .field("reconnect_attempts", &self.reconnect_attempts())
            .finish()
    }
}

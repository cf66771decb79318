use crate::ConnectionStatus;
use backend_resilience_core::ClientEvent;
use std::time::{Duration, Instant};

/// Events emitted by the health monitor.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// The connection status changed.
    StatusChanged {
        monitor_name: String,
        timestamp: Instant,
        from: ConnectionStatus,
        to: ConnectionStatus,
    },
    /// A probe finished.
    ProbeCompleted {
        monitor_name: String,
        timestamp: Instant,
        healthy: bool,
        latency: Duration,
    },
    /// A reconnect probe was scheduled after `delay`.
    ReconnectScheduled {
        monitor_name: String,
        timestamp: Instant,
        attempt: u32,
        delay: Duration,
    },
    /// Reconnection gave up.
    ReconnectExhausted {
        monitor_name: String,
        timestamp: Instant,
        attempts: u32,
    },
}

impl ClientEvent for MonitorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MonitorEvent::StatusChanged { .. } => "status_changed",
            MonitorEvent::ProbeCompleted { .. } => "probe_completed",
            MonitorEvent::ReconnectScheduled { .. } => "reconnect_scheduled",
            MonitorEvent::ReconnectExhausted { .. } => "reconnect_exhausted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            MonitorEvent::StatusChanged { timestamp, .. }
            | MonitorEvent::ProbeCompleted { timestamp, .. }
            | MonitorEvent::ReconnectScheduled { timestamp, .. }
            | MonitorEvent::ReconnectExhausted { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            MonitorEvent::StatusChanged { monitor_name, .. }
            | MonitorEvent::ProbeCompleted { monitor_name, .. }
            | MonitorEvent::ReconnectScheduled { monitor_name, .. }
            | MonitorEvent::ReconnectExhausted { monitor_name, .. } => monitor_name,
        }
    }
}

use backend_resilience_core::ClientEvent;
use std::time::Instant;

/// Why a connection left the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    /// Idle for longer than the idle timeout.
    Idle,
    /// Older than the maximum connection age.
    Aged,
    /// Failed validation on borrow.
    Invalid,
    /// Dropped by `reset()` or `close()`, or returned to the pool after one.
    Shutdown,
}

impl RemovalReason {
    /// Stable lowercase label.
    pub fn label(&self) -> &'static str {
        match self {
            RemovalReason::Idle => "idle",
            RemovalReason::Aged => "aged",
            RemovalReason::Invalid => "invalid",
            RemovalReason::Shutdown => "shutdown",
        }
    }
}

/// Events emitted by the connection pool.
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// A new connection was opened.
    Created {
        pool_name: String,
        timestamp: Instant,
        connection_id: u64,
    },
    /// A connection was lent out.
    Acquired {
        pool_name: String,
        timestamp: Instant,
        connection_id: u64,
    },
    /// A lent connection came back.
    Released {
        pool_name: String,
        timestamp: Instant,
        connection_id: u64,
    },
    /// A connection was closed and removed.
    Removed {
        pool_name: String,
        timestamp: Instant,
        connection_id: u64,
        reason: RemovalReason,
    },
    /// `acquire` failed because the pool is at capacity.
    Exhausted {
        pool_name: String,
        timestamp: Instant,
        max_connections: usize,
    },
    /// The factory failed to open a connection.
    ConnectFailed {
        pool_name: String,
        timestamp: Instant,
        message: String,
    },
}

impl ClientEvent for PoolEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PoolEvent::Created { .. } => "created",
            PoolEvent::Acquired { .. } => "acquired",
            PoolEvent::Released { .. } => "released",
            PoolEvent::Removed { .. } => "removed",
            PoolEvent::Exhausted { .. } => "exhausted",
            PoolEvent::ConnectFailed { .. } => "connect_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PoolEvent::Created { timestamp, .. }
            | PoolEvent::Acquired { timestamp, .. }
            | PoolEvent::Released { timestamp, .. }
            | PoolEvent::Removed { timestamp, .. }
            | PoolEvent::Exhausted { timestamp, .. }
            | PoolEvent::ConnectFailed { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            PoolEvent::Created { pool_name, .. }
            | PoolEvent::Acquired { pool_name, .. }
            | PoolEvent::Released { pool_name, .. }
            | PoolEvent::Removed { pool_name, .. }
            | PoolEvent::Exhausted { pool_name, .. }
            | PoolEvent::ConnectFailed { pool_name, .. } => pool_name,
        }
    }
}

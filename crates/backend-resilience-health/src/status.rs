use std::fmt;

/// Connection status tracked by the health monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ConnectionStatus {
    /// Not monitoring, or stopped.
    Disconnected,
    /// First probe in flight.
    Connecting,
    /// Last probe succeeded.
    Connected,
    /// Last probe succeeded but was slower than the degraded threshold.
    Degraded,
    /// A probe failed, or reconnection gave up.
    Error,
    /// Retrying probes with backoff.
    Reconnecting,
}

impl ConnectionStatus {
    /// All statuses in declaration order.
    pub const ALL: [ConnectionStatus; 6] = [
        ConnectionStatus::Disconnected,
        ConnectionStatus::Connecting,
        ConnectionStatus::Connected,
        ConnectionStatus::Degraded,
        ConnectionStatus::Error,
        ConnectionStatus::Reconnecting,
    ];

    /// Uppercase label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "DISCONNECTED",
            ConnectionStatus::Connecting => "CONNECTING",
            ConnectionStatus::Connected => "CONNECTED",
            ConnectionStatus::Degraded => "DEGRADED",
            ConnectionStatus::Error => "ERROR",
            ConnectionStatus::Reconnecting => "RECONNECTING",
        }
    }

    /// Whether requests are expected to reach the backend.
    pub fn is_usable(&self) -> bool {
        matches!(self, ConnectionStatus::Connected | ConnectionStatus::Degraded)
    }

    /// Whether the monitor may move from `self` to `next`.
    ///
    /// Any status may fall back to `Disconnected` on stop or reset.
    pub fn can_transition_to(&self, next: ConnectionStatus) -> bool {
        use ConnectionStatus::*;

        if next == Disconnected {
            return true;
        }
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Degraded)
                | (Connecting, Error)
                | (Connected, Degraded)
                | (Connected, Error)
                | (Degraded, Connected)
                | (Degraded, Error)
                | (Error, Reconnecting)
                | (Reconnecting, Connected)
                | (Reconnecting, Degraded)
                | (Reconnecting, Error)
        )
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionStatus::Connecting,
            2 => ConnectionStatus::Connected,
            3 => ConnectionStatus::Degraded,
            4 => ConnectionStatus::Error,
            5 => ConnectionStatus::Reconnecting,
            _ => ConnectionStatus::Disconnected,
        }
    }
}

impl From<ConnectionStatus> for u8 {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Disconnected => 0,
            ConnectionStatus::Connecting => 1,
            ConnectionStatus::Connected => 2,
            ConnectionStatus::Degraded => 3,
            ConnectionStatus::Error => 4,
            ConnectionStatus::Reconnecting => 5,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

use crate::ConnectionStatus;
use std::collections::VecDeque;
use std::time::SystemTime;

/// Number of entries the connection log keeps.
pub const CONNECTION_LOG_CAPACITY: usize = 100;

/// One recorded status change or reconnect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LogEntry {
    /// Wall-clock time of the entry.
    pub timestamp: SystemTime,
    /// Status after the entry.
    pub status: ConnectionStatus,
    /// Human-readable detail.
    pub details: String,
}

/// Ring buffer of the most recent [`LogEntry`] values, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ConnectionLog {
    entries: VecDeque<LogEntry>,
}

impl ConnectionLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(CONNECTION_LOG_CAPACITY),
        }
    }

    /// Appends an entry, dropping the oldest when full.
    pub fn push(&mut self, status: ConnectionStatus, details: impl Into<String>) {
        if self.entries.len() == CONNECTION_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            timestamp: SystemTime::now(),
            status,
            details: details.into(),
        });
    }

    /// Copies the entries out, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

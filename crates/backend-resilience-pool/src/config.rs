use crate::error::PoolError;
use std::time::Duration;

/// Longest pause between two eviction cycles.
pub const MAX_EVICTION_INTERVAL: Duration = Duration::from_secs(60);

/// Sizing and lifetime limits of a [`ConnectionPool`](crate::ConnectionPool).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Name used in events, logs and metric labels.
    pub name: String,
    /// Connections kept open even when nobody uses them.
    pub min_connections: usize,
    /// Hard cap on open connections.
    pub max_connections: usize,
    /// Idle connections unused for longer than this are closed.
    pub idle_timeout: Duration,
    /// Connections older than this are closed once idle.
    pub max_connection_age: Duration,
    /// Validate idle connections before lending them out.
    pub validate_on_borrow: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            min_connections: 1,
            max_connections: 5,
            idle_timeout: Duration::from_secs(60),
            max_connection_age: Duration::from_secs(300),
            validate_on_borrow: true,
        }
    }
}

impl PoolConfig {
    /// Creates a builder starting from the defaults.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    /// Checks the sizing invariants.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_connections == 0 {
            return Err(PoolError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(PoolError::InvalidConfig(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        if self.idle_timeout.is_zero() {
            return Err(PoolError::InvalidConfig(
                "idle_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// How often the background eviction cycle runs: the idle timeout, but
    /// at least once a minute.
    pub fn eviction_interval(&self) -> Duration {
        self.idle_timeout.min(MAX_EVICTION_INTERVAL)
    }
}

/// Builder for [`PoolConfig`].
#[derive(Debug, Clone, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Creates a builder with default values.
    ///
    /// Defaults:
    /// - min_connections: 1
    /// - max_connections: 5
    /// - idle_timeout: 60s
    /// - max_connection_age: 300s
    /// - validate_on_borrow: true
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pool name.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the number of connections kept open.
    pub fn min_connections(mut self, min: usize) -> Self {
        self.config.min_connections = min;
        self
    }

    /// Sets the cap on open connections.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Sets the idle timeout.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets the maximum connection age.
    pub fn max_connection_age(mut self, age: Duration) -> Self {
        self.config.max_connection_age = age;
        self
    }

    /// Enables or disables validation on borrow.
    pub fn validate_on_borrow(mut self, validate: bool) -> Self {
        self.config.validate_on_borrow = validate;
        self
    }

    /// Builds the configuration. Call [`PoolConfig::validate`] to check it.
    pub fn build(self) -> PoolConfig {
        self.config
    }
}

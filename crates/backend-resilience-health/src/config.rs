//! Monitor configuration.

use crate::error::MonitorError;
use std::time::Duration;

/// Settings for a [`HealthMonitor`](crate::HealthMonitor).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonitorConfig {
    /// Name used in events, logs and metric labels.
    pub name: String,
    /// Pause between probes while the connection is healthy.
    pub health_check_interval: Duration,
    /// Upper bound for a single probe; a probe that overruns counts as failed.
    pub probe_timeout: Duration,
    /// Whether a failed probe starts the reconnect cycle.
    pub auto_reconnect: bool,
    /// Reconnect probes tried before the monitor gives up and parks in `Error`.
    pub max_reconnect_attempts: u32,
    /// Backoff base for reconnect probes.
    pub reconnect_base_delay: Duration,
    /// Backoff cap for reconnect probes.
    pub reconnect_max_delay: Duration,
    /// Successful probes slower than this report `Degraded`.
    pub degraded_latency: Option<Duration>,
    /// Emit a tracing record for every status transition.
    pub enable_logging: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            name: String::from("<unnamed>"),
            health_check_interval: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(10),
            auto_reconnect: true,
            max_reconnect_attempts: 5,
            reconnect_base_delay: Duration::from_secs(1),
            reconnect_max_delay: Duration::from_secs(30),
            degraded_latency: None,
            enable_logging: true,
        }
    }
}

impl MonitorConfig {
    /// Creates a builder starting from the defaults.
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::new()
    }

    /// Checks the timing invariants.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.health_check_interval.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "health_check_interval must be greater than zero".to_string(),
            ));
        }
        if self.probe_timeout.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "probe_timeout must be greater than zero".to_string(),
            ));
        }
        if self.reconnect_base_delay > self.reconnect_max_delay {
            return Err(MonitorError::InvalidConfig(format!(
                "reconnect_base_delay ({:?}) exceeds reconnect_max_delay ({:?})",
                self.reconnect_base_delay, self.reconnect_max_delay
            )));
        }
        Ok(())
    }
}

/// Builder for [`MonitorConfig`].
#[derive(Debug, Clone, Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the monitor name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the pause between healthy probes.
    ///
    /// Default: 30 seconds
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.config.health_check_interval = interval;
        self
    }

    /// Sets the per-probe timeout.
    ///
    /// Default: 10 seconds
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    /// Enables or disables automatic reconnection.
    ///
    /// Default: true
    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.config.auto_reconnect = enabled;
        self
    }

    /// Sets how many reconnect probes run before giving up.
    ///
    /// Default: 5
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = attempts;
        self
    }

    /// Sets the reconnect backoff base and cap.
    ///
    /// Default: 1 second base, 30 second cap
    pub fn reconnect_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.config.reconnect_base_delay = base;
        self.config.reconnect_max_delay = max;
        self
    }

    /// Reports `Degraded` when a successful probe takes longer than `threshold`.
    pub fn degraded_latency(mut self, threshold: Duration) -> Self {
        self.config.degraded_latency = Some(threshold);
        self
    }

    /// Enables or disables tracing output for transitions.
    ///
    /// Default: true
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> MonitorConfig {
        self.config
    }
}

//! Client configuration.

use crate::error::ConfigError;
use backend_resilience_errors::ClassifiedError;
use backend_resilience_health::MonitorConfig;
use backend_resilience_pool::PoolConfig;
use backend_resilience_retry::{
    BackoffStrategy, RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
};
use std::time::Duration;

const UNNAMED: &str = "<unnamed>";

/// Retry settings applied by [`ResilientClient::execute`](crate::ResilientClient::execute).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration,
    /// How delays grow.
    pub strategy: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            strategy: BackoffStrategy::ExponentialJitter,
        }
    }
}

impl RetryConfig {
    /// Checks the attempt and delay bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Retry(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.base_delay > self.max_delay {
            return Err(ConfigError::Retry(format!(
                "base_delay ({:?}) exceeds max_delay ({:?})",
                self.base_delay, self.max_delay
            )));
        }
        Ok(())
    }

    /// Builds a policy that retries errors the classifier marked retryable.
    pub fn to_policy(&self, name: impl Into<String>) -> RetryPolicy<ClassifiedError> {
        RetryPolicy::builder()
            .name(name)
            .max_attempts(self.max_attempts)
            .strategy(self.strategy)
            .base_delay(self.base_delay)
            .max_delay(self.max_delay)
            .build()
    }
}

/// Complete configuration of a [`ResilientClient`](crate::ResilientClient).
///
/// Component names left at their default inherit the client name.
///
/// # Examples
///
/// ```
/// use backend_resilience::{ClientConfig, RetryConfig};
/// use backend_resilience::pool::PoolConfig;
///
/// let config = ClientConfig::builder()
///     .name("orders-db")
///     .pool(PoolConfig::builder().max_connections(10).build())
///     .retry(RetryConfig { max_attempts: 5, ..Default::default() })
///     .build();
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// Name used in logs and metric labels.
    pub name: String,
    pub pool: PoolConfig,
    pub retry: RetryConfig,
    pub monitor: MonitorConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "backend".to_string(),
            pool: PoolConfig::default(),
            retry: RetryConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a builder starting from the defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Checks every component's invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        self.retry.validate()?;
        self.pool.validate()?;
        self.monitor.validate()?;
        Ok(())
    }

    /// Copies the client name into components that were left unnamed.
    pub(crate) fn with_inherited_names(mut self) -> Self {
        if self.pool.name == UNNAMED {
            self.pool.name = self.name.clone();
        }
        if self.monitor.name == UNNAMED {
            self.monitor.name = self.name.clone();
        }
        self
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.config.pool = pool;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn monitor(mut self, monitor: MonitorConfig) -> Self {
        self.config.monitor = monitor;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

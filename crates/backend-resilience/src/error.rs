//! Errors raised while configuring and building a client.

use backend_resilience_health::MonitorError;
use backend_resilience_pool::PoolError;

/// A configuration invariant was violated.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("client name must not be empty")]
    EmptyName,
    #[error("invalid retry configuration: {0}")]
    Retry(String),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

/// Errors returned by [`ResilientClientBuilder::build`](crate::ResilientClientBuilder::build).
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// `factory` was never called on the builder.
    #[error("no connection factory was provided")]
    MissingFactory,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

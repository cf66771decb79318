//! Error types for the connection pool.

use backend_resilience_errors::{ClassifiedError, ErrorCategory};

/// Backend code carried by classified pool-exhaustion errors.
pub const POOL_EXHAUSTED: &str = "POOL_EXHAUSTED";
/// Backend code carried by classified closed-pool errors.
pub const POOL_CLOSED: &str = "POOL_CLOSED";

/// Errors returned by the connection pool.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PoolError {
    /// Every connection is lent out and the pool is at capacity.
    #[error("connection pool exhausted: all {max_connections} connections are in use")]
    Exhausted {
        /// Capacity of the pool.
        max_connections: usize,
    },
    /// The pool was closed.
    #[error("connection pool is closed")]
    Closed,
    /// The factory failed to open a connection.
    #[error("failed to open connection: {0}")]
    Connect(#[source] ClassifiedError),
    /// The configuration violates a sizing invariant.
    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

impl From<PoolError> for ClassifiedError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Connect(classified) => classified,
            PoolError::Exhausted { max_connections } => {
                ClassifiedError::new(ErrorCategory::Unknown, err.to_string())
                    .with_code(POOL_EXHAUSTED)
                    .with_detail("max_connections", max_connections.to_string())
                    .with_retryable(false)
            }
            PoolError::Closed => ClassifiedError::new(ErrorCategory::Unknown, err.to_string())
                .with_code(POOL_CLOSED)
                .with_retryable(false),
            PoolError::InvalidConfig(_) => {
                ClassifiedError::new(ErrorCategory::Config, err.to_string())
            }
        }
    }
}

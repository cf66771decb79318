//! A resilient client layer for backend services.
//!
//! [`ResilientClient`] puts four components behind one facade:
//!
//! - [`errors`]: reduces every failure to a [`ClassifiedError`] with one of
//!   nine categories and a retryability flag
//! - [`retry`]: re-runs failed operations with exponential backoff and jitter
//! - [`pool`]: lends out a bounded set of backend connections, evicting idle
//!   and aged ones
//! - [`health`]: probes the backend periodically and reconnects with backoff
//!
//! Each component is usable on its own through the re-exported crates.
//!
//! # Example
//!
//! ```
//! use backend_resilience::{ClientConfig, ConnectionStatus, ResilientClient, RetryConfig};
//! use backend_resilience::errors::{BackendFailure, ClassifiedError, ErrorCategory};
//! use backend_resilience::pool::ConnectionFactory;
//! use std::time::Duration;
//!
//! struct Db;
//!
//! impl ConnectionFactory for Db {
//!     type Connection = String;
//!
//!     async fn connect(&self) -> Result<String, ClassifiedError> {
//!         Ok("db-session".to_string())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = ClientConfig::builder()
//!     .name("orders")
//!     .retry(RetryConfig { base_delay: Duration::from_millis(1), ..Default::default() })
//!     .build();
//!
//! let client = ResilientClient::builder()
//!     .config(config)
//!     .factory(Db)
//!     .build()
//!     .await
//!     .unwrap();
//!
//! // Permission errors are never retried.
//! let err = client
//!     .execute(|_conn| async { Err::<(), _>(BackendFailure::new("denied").code("42501")) })
//!     .await
//!     .unwrap_err();
//! assert_eq!(err.category(), ErrorCategory::Permission);
//! assert!(!err.is_retryable());
//!
//! client.shutdown().await;
//! assert_eq!(client.status(), ConnectionStatus::Disconnected);
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `tracing` (default): structured logs from every component
//! - `metrics`: counters and gauges from every component, plus
//!   `client_executions_total`
//! - `serde`: (de)serialize [`ClientConfig`] and error categories

mod client;
mod config;
mod error;

pub use client::{ResilientClient, ResilientClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder, RetryConfig};
pub use error::{ClientBuildError, ConfigError};

pub use backend_resilience_core as core;
pub use backend_resilience_errors as errors;
pub use backend_resilience_health as health;
pub use backend_resilience_pool as pool;
pub use backend_resilience_retry as retry;

pub use backend_resilience_errors::{classify, ClassifiedError, ErrorCategory, Failure};
pub use backend_resilience_health::{ConnectionStatus, HealthProbe};
pub use backend_resilience_pool::ConnectionFactory;

//! Connection health monitoring for the resilient backend client.
//!
//! A [`HealthMonitor`] runs a [`HealthProbe`] on a fixed interval and tracks
//! the result as a [`ConnectionStatus`]. When a probe fails it reconnects by
//! re-probing with exponential backoff and half jitter, up to
//! `max_reconnect_attempts` times, and then parks in `ERROR` until it is reset
//! or asked to probe again.
//!
//! Every status change is
//! - stored in a bounded [`ConnectionLog`] (the newest
//!   [`CONNECTION_LOG_CAPACITY`] entries),
//! - delivered in order to callbacks and [`StatusStream`]s,
//! - reported as a [`MonitorEvent`] to registered listeners.
//!
//! # Example
//!
//! ```
//! use backend_resilience_health::{ConnectionStatus, HealthMonitor, MonitorConfig};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = MonitorConfig::builder()
//!     .name("primary-db")
//!     .health_check_interval(Duration::from_secs(10))
//!     .max_reconnect_attempts(3)
//!     .build();
//!
//! let monitor = HealthMonitor::start(|| async { true }, config).unwrap();
//! let _handle = monitor.on_status_change(|status| {
//!     println!("connection is now {status}");
//! });
//!
//! monitor.shutdown().await;
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `tracing`: log transitions (gated by `enable_logging`) and probe results
//! - `metrics`: `health_status_transitions_total`, `health_status`,
//!   `health_probes_total`, `health_reconnect_attempts_total`
//! - `serde`: serialize statuses and log entries, (de)serialize [`MonitorConfig`]

mod config;
mod error;
mod events;
mod log;
mod monitor;
mod probe;
mod status;
mod subscribers;

pub use config::{MonitorConfig, MonitorConfigBuilder};
pub use error::MonitorError;
pub use events::MonitorEvent;
pub use log::{ConnectionLog, LogEntry, CONNECTION_LOG_CAPACITY};
pub use monitor::HealthMonitor;
pub use probe::HealthProbe;
pub use status::ConnectionStatus;
pub use subscribers::{StatusStream, Unsubscribe};

//! Error classification for the resilient backend client.
//!
//! Every failure the client observes (a structured backend error, a dropped
//! connection, a bare message) is reduced to a [`ClassifiedError`] with one
//! of nine [`ErrorCategory`] values and a retryability flag. The retry
//! executor consults that flag to decide whether another attempt can help.
//!
//! # Examples
//!
//! ```
//! use backend_resilience_errors::{classify, ClassifiedError, ErrorCategory, ErrorKind};
//!
//! let err = classify(std::io::Error::new(
//!     std::io::ErrorKind::ConnectionRefused,
//!     "connection refused",
//! ));
//! assert_eq!(err.category(), ErrorCategory::Network);
//! assert!(err.is_retryable());
//!
//! let err = ClassifiedError::from_status(404, None);
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//! assert!(!err.is_retryable());
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: serialize [`ErrorCategory`] and [`ErrorKind`]
//! - `tracing`: emit a debug event for every classification

mod category;
mod classifier;
pub mod codes;
mod error;
mod failure;

pub use category::{ErrorCategory, UnknownCategory};
pub use classifier::{classify, Classifier};
pub use error::{ClassifiedError, ErrorKind, Retryable, SharedCause};
pub use failure::{BackendFailure, Failure, TransportFailure, TransportKind};

//! Raw failures accepted by the classifier.

use crate::error::{ClassifiedError, SharedCause};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Any failure the client can observe, before classification.
///
/// Backend SDKs, transports and application code all funnel their errors
/// through this type; [`classify`](crate::classify) turns it into a
/// [`ClassifiedError`].
#[derive(Debug, Clone)]
pub enum Failure {
    /// Structured error reported by the backend.
    Backend(BackendFailure),
    /// The request never got a response.
    Transport(TransportFailure),
    /// Free-form error text with nothing else to go on.
    Message(String),
    /// A failure that was already classified.
    Classified(ClassifiedError),
}

impl Failure {
    /// Best available human-readable text for this failure.
    pub fn message(&self) -> &str {
        match self {
            Failure::Backend(backend) => &backend.message,
            Failure::Transport(transport) => &transport.message,
            Failure::Message(message) => message,
            Failure::Classified(classified) => classified.message(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Classified(classified) => fmt::Display::fmt(classified, f),
            other => f.write_str(other.message()),
        }
    }
}

/// Error payload reported by the backend service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendFailure {
    /// Transport status code, if the response carried one.
    pub status: Option<u16>,
    /// Backend-specific code (SQLSTATE, gateway code, auth error code).
    pub code: Option<String>,
    /// Error type name reported by the SDK, e.g. `AuthApiError`.
    pub name: Option<String>,
    /// Error text.
    pub message: String,
    /// Extra fields (hint, details, …).
    pub details: BTreeMap<String, String>,
}

impl BackendFailure {
    /// Creates a backend failure with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Sets the status code.
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the backend code.
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Sets the error type name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a detail field.
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl From<BackendFailure> for Failure {
    fn from(backend: BackendFailure) -> Self {
        Failure::Backend(backend)
    }
}

/// Flavour of transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// No response within the allotted time.
    Timeout,
    /// The backend refused the connection.
    ConnectionRefused,
    /// The connection dropped mid-request.
    ConnectionReset,
    /// The device has no network.
    Offline,
    /// Any other I/O-level failure.
    Other,
}

impl TransportKind {
    fn describe(&self) -> &'static str {
        match self {
            TransportKind::Timeout => "request timed out",
            TransportKind::ConnectionRefused => "connection refused",
            TransportKind::ConnectionReset => "connection reset",
            TransportKind::Offline => "network offline",
            TransportKind::Other => "network error",
        }
    }
}

/// A request that failed below the application protocol.
#[derive(Debug, Clone)]
pub struct TransportFailure {
    /// What went wrong.
    pub kind: TransportKind,
    /// Error text.
    pub message: String,
    /// Underlying error, if any.
    pub source: Option<SharedCause>,
}

impl TransportFailure {
    /// Creates a transport failure with the default message for `kind`.
    pub fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            message: kind.describe().to_string(),
            source: None,
        }
    }

    /// Replaces the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attaches the underlying error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }
}

impl From<TransportFailure> for Failure {
    fn from(transport: TransportFailure) -> Self {
        Failure::Transport(transport)
    }
}

fn transport_kind_for(kind: std::io::ErrorKind) -> Option<TransportKind> {
    use std::io::ErrorKind as Io;

    match kind {
        Io::TimedOut | Io::WouldBlock => Some(TransportKind::Timeout),
        Io::ConnectionRefused => Some(TransportKind::ConnectionRefused),
        Io::ConnectionReset | Io::ConnectionAborted | Io::BrokenPipe | Io::UnexpectedEof => {
            Some(TransportKind::ConnectionReset)
        }
        Io::NotConnected | Io::AddrNotAvailable | Io::AddrInUse => Some(TransportKind::Offline),
        Io::Interrupted => Some(TransportKind::Other),
        _ => None,
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        match transport_kind_for(err.kind()) {
            Some(kind) => Failure::Transport(TransportFailure {
                kind,
                message: err.to_string(),
                source: Some(Arc::new(err)),
            }),
            // Not a socket problem (permissions, missing file, bad data); let
            // the message heuristics decide.
            None => Failure::Message(err.to_string()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for Failure {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Failure::Transport(TransportFailure::new(TransportKind::Timeout).with_source(err))
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::Message(message)
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::Message(message.to_string())
    }
}

impl From<ClassifiedError> for Failure {
    fn from(err: ClassifiedError) -> Self {
        Failure::Classified(err)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync + 'static>> for Failure {
    fn from(err: Box<dyn std::error::Error + Send + Sync + 'static>) -> Self {
        let err = match err.downcast::<ClassifiedError>() {
            Ok(classified) => return Failure::Classified(*classified),
            Err(other) => other,
        };
        let err = match err.downcast::<std::io::Error>() {
            Ok(io) => return Failure::from(*io),
            Err(other) => other,
        };
        let err = match err.downcast::<tokio::time::error::Elapsed>() {
            Ok(elapsed) => return Failure::from(*elapsed),
            Err(other) => other,
        };
        Failure::Message(err.to_string())
    }
}

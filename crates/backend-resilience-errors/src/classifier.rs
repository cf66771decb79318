//! Turns raw failures into [`ClassifiedError`]s.

use crate::category::ErrorCategory;
use crate::codes;
use crate::error::{ClassifiedError, ErrorKind, Retryable};
use crate::failure::{BackendFailure, Failure, TransportFailure, TransportKind};
use std::fmt;
use std::sync::Arc;

const GENERIC_MESSAGE: &str = "An unknown error occurred";

const AUTH_TOKENS: &[&str] = &[
    "jwt",
    "unauthorized",
    "not authenticated",
    "invalid login",
    "session expired",
    "session missing",
    "token expired",
    "refresh token",
];

const NETWORK_TOKENS: &[&str] = &[
    "network",
    "timeout",
    "timed out",
    "offline",
    "failed to fetch",
    "connection refused",
    "connection reset",
    "econnrefused",
    "econnreset",
];

const STORAGE_TOKENS: &[&str] = &["storage", "bucket"];

const CONFIG_TOKENS: &[&str] = &[
    "configuration",
    "config",
    "environment",
    "credentials",
    "api key",
    "apikey",
];

fn mentions(haystack: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| haystack.contains(token))
}

/// Classifies any failure.
///
/// Already classified failures are returned unchanged. Never panics; input
/// that matches nothing becomes [`ErrorCategory::Unknown`].
///
/// # Examples
///
/// ```
/// use backend_resilience_errors::{classify, BackendFailure, ErrorCategory};
///
/// let err = classify(BackendFailure::new("deadlock detected").code("40P01"));
/// assert_eq!(err.category(), ErrorCategory::Database);
/// assert!(err.is_retryable());
///
/// let err = classify("JWT expired");
/// assert_eq!(err.category(), ErrorCategory::Auth);
/// assert!(!err.is_retryable());
/// ```
pub fn classify(failure: impl Into<Failure>) -> ClassifiedError {
    let classified = match failure.into() {
        Failure::Classified(classified) => return classified,
        Failure::Backend(backend) => classify_backend(backend),
        Failure::Transport(transport) => classify_transport(transport),
        Failure::Message(message) => classify_message(message),
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        category = classified.category().label(),
        status = classified.status_code(),
        code = classified.code(),
        retryable = classified.is_retryable(),
        "classified failure"
    );

    classified
}

fn classify_transport(transport: TransportFailure) -> ClassifiedError {
    let kind = match transport.kind {
        TransportKind::Timeout => ErrorKind::Timeout,
        _ => ErrorKind::Network,
    };
    let mut err = ClassifiedError::new(ErrorCategory::Network, transport.message).with_kind(kind);
    if let Some(source) = transport.source {
        err = err.with_shared_cause(source);
    }
    err
}

fn classify_message(message: String) -> ClassifiedError {
    let lower = message.to_lowercase();
    let category = category_from_text(&lower).unwrap_or(ErrorCategory::Unknown);
    let message = if message.trim().is_empty() {
        GENERIC_MESSAGE.to_string()
    } else {
        message
    };
    ClassifiedError::new(category, message)
}

fn classify_backend(backend: BackendFailure) -> ClassifiedError {
    let BackendFailure {
        status,
        code,
        name,
        message,
        details,
    } = backend;

    let lower = message.to_lowercase();
    let code_ref = code.as_deref();
    let auth_name = name.as_deref().is_some_and(|n| n.starts_with("Auth"));

    let category = if matches!(status, Some(401 | 403)) || auth_name || mentions(&lower, AUTH_TOKENS) {
        ErrorCategory::Auth
    } else if status == Some(408) || mentions(&lower, NETWORK_TOKENS) {
        ErrorCategory::Network
    } else if status == Some(429) || code_ref.is_some_and(codes::is_rate_limit_code) {
        ErrorCategory::RateLimit
    } else if code_ref.is_some_and(codes::is_permission_code) {
        ErrorCategory::Permission
    } else if status == Some(422) || code_ref.is_some_and(codes::is_validation_code) {
        ErrorCategory::Validation
    } else if code_ref.is_some_and(codes::is_database_code) {
        ErrorCategory::Database
    } else if name.as_deref().is_some_and(|n| n.starts_with("Storage")) || mentions(&lower, STORAGE_TOKENS) {
        ErrorCategory::Storage
    } else if mentions(&lower, CONFIG_TOKENS) {
        ErrorCategory::Config
    } else {
        ErrorCategory::Unknown
    };

    let message = if message.trim().is_empty() {
        GENERIC_MESSAGE.to_string()
    } else {
        message
    };

    let mut err = ClassifiedError::new(category, message).with_details(details);
    if let Some(status) = status {
        err = err.with_status(status);
    }
    if let Some(code) = code {
        err = err.with_code(code);
    }
    if let Some(name) = name {
        err = err.with_detail("name", name);
    }
    err
}

/// Category implied by free-form text alone, in classification order.
fn category_from_text(lower: &str) -> Option<ErrorCategory> {
    if mentions(lower, AUTH_TOKENS) {
        Some(ErrorCategory::Auth)
    } else if mentions(lower, NETWORK_TOKENS) {
        Some(ErrorCategory::Network)
    } else if mentions(lower, STORAGE_TOKENS) {
        Some(ErrorCategory::Storage)
    } else if mentions(lower, CONFIG_TOKENS) {
        Some(ErrorCategory::Config)
    } else {
        None
    }
}

type Hook = Arc<dyn Fn(&ClassifiedError) + Send + Sync>;

/// A classifier with an optional observation hook.
///
/// The hook sees every classification result, e.g. to feed an error
/// reporter. A panicking hook is contained.
#[derive(Clone, Default)]
pub struct Classifier {
    hook: Option<Hook>,
}

impl Classifier {
    /// Creates a classifier without a hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a hook called with every classification result.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ClassifiedError) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Classifies `failure`, then runs the hook.
    pub fn classify(&self, failure: impl Into<Failure>) -> ClassifiedError {
        let classified = classify(failure);
        if let Some(hook) = &self.hook {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| hook(&classified)));
        }
        classified
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl Retryable for std::io::Error {
    fn is_retryable(&self) -> bool {
        classify(std::io::Error::new(self.kind(), self.to_string())).is_retryable()
    }
}

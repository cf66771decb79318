//! The classified error type.

use crate::category::ErrorCategory;
use crate::codes;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// Shared, type-erased cause of a classified error.
pub type SharedCause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// More specific sub-type of a classified error.
///
/// The category drives retry behaviour; the kind lets callers match on the
/// precise condition (e.g. "not found" vs. any other client error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// No more specific kind applies.
    Generic,
    /// The request payload was rejected.
    Validation,
    /// Credentials are missing or invalid.
    Authentication,
    /// The caller lacks the required permission.
    Permission,
    /// The addressed resource does not exist.
    NotFound,
    /// The request or connection timed out.
    Timeout,
    /// The backend throttled the request.
    RateLimit,
    /// The backend failed with a server-side error.
    Server,
    /// Transport-level failure other than a timeout.
    Network,
    /// Database-level failure.
    Database,
    /// Storage-level failure.
    Storage,
    /// Client configuration problem.
    Config,
}

impl ErrorKind {
    /// Kind implied by a category when nothing more specific is known.
    pub fn for_category(category: ErrorCategory, status: Option<u16>) -> Self {
        match category {
            ErrorCategory::Auth => ErrorKind::Authentication,
            ErrorCategory::Network if status == Some(408) => ErrorKind::Timeout,
            ErrorCategory::Network => ErrorKind::Network,
            ErrorCategory::Database => ErrorKind::Database,
            ErrorCategory::Storage => ErrorKind::Storage,
            ErrorCategory::Config => ErrorKind::Config,
            ErrorCategory::RateLimit => ErrorKind::RateLimit,
            ErrorCategory::Permission => ErrorKind::Permission,
            ErrorCategory::Validation => ErrorKind::Validation,
            ErrorCategory::Unknown => match status {
                Some(404) => ErrorKind::NotFound,
                Some(500..=599) => ErrorKind::Server,
                _ => ErrorKind::Generic,
            },
        }
    }
}

/// Derives retryability from category, status and backend code.
pub(crate) fn derive_retryable(
    category: ErrorCategory,
    status_code: Option<u16>,
    code: Option<&str>,
) -> bool {
    if let Some(retryable) = category.default_retryable() {
        return retryable;
    }
    if category == ErrorCategory::Database {
        return code.is_some_and(codes::is_transient_database_code);
    }
    status_code.is_some_and(|status| (500..=599).contains(&status) || status == 408 || status == 429)
}

/// A failure annotated with a category, retryability and structured details.
///
/// Built once where the failure is first observed and never mutated
/// afterwards; the `with_*` methods consume the value while it is still being
/// assembled.
#[derive(Clone)]
pub struct ClassifiedError {
    message: String,
    category: ErrorCategory,
    kind: ErrorKind,
    status_code: Option<u16>,
    code: Option<String>,
    retryable: bool,
    retryable_overridden: bool,
    details: BTreeMap<String, String>,
    timestamp: SystemTime,
    cause: Option<SharedCause>,
}

impl ClassifiedError {
    /// Creates an error of the given category.
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category,
            kind: ErrorKind::for_category(category, None),
            status_code: None,
            code: None,
            retryable: derive_retryable(category, None, None),
            retryable_overridden: false,
            details: BTreeMap::new(),
            timestamp: SystemTime::now(),
            cause: None,
        }
    }

    /// Maps a transport-level status code directly to a typed error.
    ///
    /// Used when the transport already has a structured status, bypassing the
    /// message heuristics of [`classify`](crate::classify).
    pub fn from_status(status: u16, message: Option<&str>) -> Self {
        let (category, kind, fallback) = match status {
            400 | 422 => (
                ErrorCategory::Validation,
                ErrorKind::Validation,
                "Request validation failed".to_string(),
            ),
            401 => (
                ErrorCategory::Auth,
                ErrorKind::Authentication,
                "Authentication required".to_string(),
            ),
            403 => (
                ErrorCategory::Permission,
                ErrorKind::Permission,
                "Permission denied".to_string(),
            ),
            404 => (
                ErrorCategory::Unknown,
                ErrorKind::NotFound,
                "Resource not found".to_string(),
            ),
            408 => (
                ErrorCategory::Network,
                ErrorKind::Timeout,
                "Request timed out".to_string(),
            ),
            429 => (
                ErrorCategory::RateLimit,
                ErrorKind::RateLimit,
                "Too many requests".to_string(),
            ),
            500..=599 => (
                ErrorCategory::Unknown,
                ErrorKind::Server,
                format!("Server error ({status})"),
            ),
            _ => (
                ErrorCategory::Unknown,
                ErrorKind::Generic,
                format!("Request failed with status {status}"),
            ),
        };

        let message = message
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or(fallback);

        Self::new(category, message)
            .with_status(status)
            .with_kind(kind)
    }

    /// Attaches the transport status code. Recomputes retryability unless it
    /// was overridden.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        if self.kind == ErrorKind::for_category(self.category, None) {
            self.kind = ErrorKind::for_category(self.category, Some(status));
        }
        self.refresh_retryable();
        self
    }

    /// Attaches the backend-specific error code. Recomputes retryability
    /// unless it was overridden.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self.refresh_retryable();
        self
    }

    /// Re-wraps the error as a more specific kind, keeping every other field.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds one structured detail.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Adds several structured details.
    pub fn with_details<I, K, V>(mut self, details: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.details
            .extend(details.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Wraps the original error.
    pub fn with_cause<E>(self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.with_shared_cause(Arc::new(cause))
    }

    /// Wraps an already shared original error.
    pub fn with_shared_cause(mut self, cause: SharedCause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Overrides the derived retryability.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self.retryable_overridden = true;
        self
    }

    fn refresh_retryable(&mut self) {
        if !self.retryable_overridden {
            self.retryable = derive_retryable(self.category, self.status_code, self.code.as_deref());
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Category of the failure.
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Specific kind of the failure.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Transport status code, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Backend error code, if any.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Whether retrying the failed operation may succeed.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Structured details.
    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    /// When the failure was classified.
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// The wrapped original error, if any.
    pub fn cause(&self) -> Option<&SharedCause> {
        self.cause.as_ref()
    }

    /// Short user-facing message derived from the category.
    pub fn user_message(&self) -> &'static str {
        self.category.user_message()
    }
}

impl fmt::Debug for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifiedError")
            .field("message", &self.message)
            .field("category", &self.category)
            .field("kind", &self.kind)
            .field("status_code", &self.status_code)
            .field("code", &self.code)
            .field("retryable", &self.retryable)
            .field("details", &self.details)
            .field("cause", &self.cause.as_ref().map(|c| c.to_string()))
            .finish()
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Errors that know whether retrying may help.
///
/// This is what the retry executor consults when no explicit retry predicate
/// is configured.
pub trait Retryable {
    /// Returns true if the failed operation may succeed when retried.
    fn is_retryable(&self) -> bool;
}

impl Retryable for ClassifiedError {
    fn is_retryable(&self) -> bool {
        self.retryable
    }
}

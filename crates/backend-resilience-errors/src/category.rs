//! Error categories.

use std::fmt;
use std::str::FromStr;

/// The closed set of failure categories.
///
/// Every failure observed by the client reduces to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ErrorCategory {
    /// Missing, expired or rejected credentials.
    Auth,
    /// Transport failure: unreachable backend, timeout, offline.
    Network,
    /// Backend data store failure (constraints, transactions, connections).
    Database,
    /// Object/file storage failure.
    Storage,
    /// Client misconfiguration (endpoint, environment, credentials).
    Config,
    /// The backend asked us to slow down.
    RateLimit,
    /// Authenticated but not allowed.
    Permission,
    /// The request was rejected as invalid.
    Validation,
    /// Anything else.
    Unknown,
}

impl ErrorCategory {
    /// All categories, in declaration order.
    pub const ALL: [ErrorCategory; 9] = [
        ErrorCategory::Auth,
        ErrorCategory::Network,
        ErrorCategory::Database,
        ErrorCategory::Storage,
        ErrorCategory::Config,
        ErrorCategory::RateLimit,
        ErrorCategory::Permission,
        ErrorCategory::Validation,
        ErrorCategory::Unknown,
    ];

    /// Stable lowercase label, suitable for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::Auth => "auth",
            ErrorCategory::Network => "network",
            ErrorCategory::Database => "database",
            ErrorCategory::Storage => "storage",
            ErrorCategory::Config => "config",
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::Permission => "permission",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Unknown => "unknown",
        }
    }

    /// Retryability decided by the category alone.
    ///
    /// Returns `None` for categories whose retryability depends on the status
    /// code or backend error code (`Database`, `Storage`, `Unknown`).
    pub fn default_retryable(&self) -> Option<bool> {
        match self {
            ErrorCategory::Network | ErrorCategory::RateLimit => Some(true),
            ErrorCategory::Auth
            | ErrorCategory::Permission
            | ErrorCategory::Validation
            | ErrorCategory::Config => Some(false),
            ErrorCategory::Database | ErrorCategory::Storage | ErrorCategory::Unknown => None,
        }
    }

    /// Short message suitable for showing to an end user.
    ///
    /// Never contains backend error text.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::Auth => "Your session has expired. Please sign in again.",
            ErrorCategory::Network => "Network unreachable. Check your connection and retry.",
            ErrorCategory::Database => "The server could not save or load your data. Please retry.",
            ErrorCategory::Storage => "The file could not be stored or retrieved.",
            ErrorCategory::Config => "The application is misconfigured. Please contact support.",
            ErrorCategory::RateLimit => "Too many requests. Please wait a moment and retry.",
            ErrorCategory::Permission => "You do not have permission to do that.",
            ErrorCategory::Validation => "Some of the submitted information is invalid.",
            ErrorCategory::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for ErrorCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ErrorCategory::ALL
            .into_iter()
            .find(|category| category.label() == normalized)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

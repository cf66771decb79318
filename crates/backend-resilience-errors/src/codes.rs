//! Backend error codes the classifier knows about.
//!
//! The hosted backend fronts a Postgres database through a REST gateway, so
//! most structured codes are either SQLSTATE values or gateway (`PGRST`)
//! identifiers.

/// Codes reported when the backend throttles the caller.
const RATE_LIMIT_CODES: &[&str] = &[
    "429",
    "too_many_requests",
    "over_request_rate_limit",
    "over_email_send_rate_limit",
    "rate_limit_exceeded",
];

/// Explicit permission denials.
const PERMISSION_CODES: &[&str] = &["42501", "insufficient_privilege", "permission_denied"];

/// Explicit validation failures. Checked before the generic database prefixes.
const VALIDATION_CODES: &[&str] = &["22P02", "23514", "validation_failed", "validation_error"];

/// SQLSTATE classes and gateway prefixes that identify a database-side failure.
const DATABASE_PREFIXES: &[&str] = &["08", "22", "23", "40", "53", "57", "XX", "PGRST"];

/// Database codes that describe a transient condition worth retrying.
const TRANSIENT_DATABASE_CODES: &[&str] = &["40001", "40P01", "53300", "57P01", "57014"];

fn matches_any(code: &str, table: &[&str]) -> bool {
    table.iter().any(|known| code.eq_ignore_ascii_case(known))
}

/// Returns true if `code` signals rate limiting.
pub fn is_rate_limit_code(code: &str) -> bool {
    matches_any(code, RATE_LIMIT_CODES)
}

/// Returns true if `code` is an explicit permission denial.
pub fn is_permission_code(code: &str) -> bool {
    matches_any(code, PERMISSION_CODES)
}

/// Returns true if `code` is an explicit validation failure.
pub fn is_validation_code(code: &str) -> bool {
    matches_any(code, VALIDATION_CODES)
}

/// Returns true if `code` belongs to a known database error class.
pub fn is_database_code(code: &str) -> bool {
    let upper = code.to_ascii_uppercase();
    DATABASE_PREFIXES
        .iter()
        .any(|prefix| upper.starts_with(prefix))
}

/// Returns true if `code` is a transient database condition (deadlock,
/// serialization failure, connection trouble, resource pressure).
pub fn is_transient_database_code(code: &str) -> bool {
    let upper = code.to_ascii_uppercase();
    upper.starts_with("08") || matches_any(&upper, TRANSIENT_DATABASE_CODES)
}

//! Property tests for error classification.
//!
//! Invariants tested:
//! - Classification is deterministic
//! - Classifying a classified error changes nothing
//! - Categories with a fixed retryability always report it

use backend_resilience::classify;
use backend_resilience::errors::{BackendFailure, ClassifiedError};
use proptest::prelude::*;

fn codes() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        prop::sample::select(vec![
            "42501", "22P02", "23514", "23505", "40001", "40P01", "08006", "53300", "57014",
            "XX000", "PGRST116", "429", "over_request_rate_limit", "invalid_jwt",
        ])
        .prop_map(|code| Some(code.to_string())),
        "[A-Z0-9]{5}".prop_map(Some),
    ]
}

fn statuses() -> impl Strategy<Value = Option<u16>> {
    prop_oneof![
        Just(None),
        prop::sample::select(vec![400u16, 401, 403, 404, 408, 409, 422, 429, 500, 502, 503, 504])
            .prop_map(Some),
        (100u16..600).prop_map(Some),
    ]
}

fn messages() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec![
            "",
            "JWT expired",
            "network request failed",
            "connection reset by peer",
            "bucket not found",
            "missing configuration",
            "duplicate key value violates unique constraint",
        ])
        .prop_map(str::to_string),
        ".{0,40}",
    ]
}

fn failure(status: Option<u16>, code: &Option<String>, message: &str) -> BackendFailure {
    let mut failure = BackendFailure::new(message);
    if let Some(status) = status {
        failure = failure.status(status);
    }
    if let Some(code) = code {
        failure = failure.code(code.clone());
    }
    failure
}

fn fingerprint(err: &ClassifiedError) -> (String, bool, Option<u16>, Option<String>) {
    (
        err.category().label().to_string(),
        err.is_retryable(),
        err.status_code(),
        err.code().map(str::to_string),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Property: the same input always yields the same classification
    #[test]
    fn classification_is_deterministic(status in statuses(), code in codes(), message in messages()) {
        let first = classify(failure(status, &code, &message));
        let second = classify(failure(status, &code, &message));
        prop_assert_eq!(fingerprint(&first), fingerprint(&second));
        prop_assert_eq!(first.message(), second.message());
    }

    /// Property: reclassifying is a no-op
    #[test]
    fn classification_is_idempotent(status in statuses(), code in codes(), message in messages()) {
        let first = classify(failure(status, &code, &message));
        let again = classify(first.clone());
        prop_assert_eq!(fingerprint(&first), fingerprint(&again));
    }

    /// Property: fixed-retryability categories never report the opposite
    #[test]
    fn retryability_matches_category_default(status in statuses(), code in codes(), message in messages()) {
        let err = classify(failure(status, &code, &message));
        if let Some(expected) = err.category().default_retryable() {
            prop_assert_eq!(err.is_retryable(), expected);
        }
        prop_assert!(!err.message().is_empty());
    }

    /// Property: plain messages never panic and never lose their text
    #[test]
    fn messages_classify_without_panicking(message in "\\PC{1,60}") {
        let err = classify(message.clone());
        if !message.trim().is_empty() {
            prop_assert_eq!(err.message(), message.as_str());
        }
    }
}

//! Retry metrics regression tests

use super::helpers::*;
use backend_resilience::errors::{BackendFailure, ClassifiedError, ErrorCategory};
use backend_resilience::retry::RetryPolicy;
use backend_resilience::classify;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
#[serial]
async fn retry_metrics_exist() {
    init_recorder();

    let policy = RetryPolicy::<ClassifiedError>::builder()
        .name("test_retry")
        .max_attempts(3)
        .fixed_backoff(Duration::from_millis(1))
        .build();

    let calls = AtomicUsize::new(0);
    let result = policy
        .execute(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ClassifiedError::new(ErrorCategory::Network, "reset"))
                } else {
                    Ok("done")
                }
            }
        })
        .await;
    assert_eq!(result.unwrap(), "done");

    assert_counter_exists("retry_calls_total");
    assert_metric_has_label("retry_calls_total", "retry", "test_retry");
    assert_metric_has_label("retry_calls_total", "result", "success");

    assert_counter_exists("retry_attempts_total");
    assert_metric_has_label("retry_attempts_total", "retry", "test_retry");
}

#[tokio::test]
#[serial]
async fn retry_exhausted_metrics() {
    init_recorder();

    let policy = RetryPolicy::<ClassifiedError>::builder()
        .name("exhausted_retry")
        .max_attempts(2)
        .fixed_backoff(Duration::from_millis(1))
        .build();

    let _ = policy
        .execute(|| async {
            Err::<(), _>(ClassifiedError::new(ErrorCategory::Network, "reset"))
        })
        .await;

    assert_metric_has_label("retry_calls_total", "retry", "exhausted_retry");
    assert_metric_has_label("retry_calls_total", "result", "exhausted");
}

#[tokio::test]
#[serial]
async fn retry_ignored_metrics() {
    init_recorder();

    let policy = RetryPolicy::<ClassifiedError>::builder()
        .name("ignored_retry")
        .max_attempts(5)
        .no_backoff()
        .build();

    let _ = policy
        .execute(|| async {
            Err::<(), _>(classify(BackendFailure::new("bad input").code("22P02")))
        })
        .await;

    assert_metric_has_label("retry_calls_total", "retry", "ignored_retry");
    assert_metric_has_label("retry_calls_total", "result", "ignored");
}

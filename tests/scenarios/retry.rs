use super::common::network_error;
use backend_resilience::errors::{BackendFailure, ClassifiedError, ErrorCategory};
use backend_resilience::retry::{wrap, RetryPolicy, RetryPolicyBuilder};
use backend_resilience::classify;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test(start_paused = true)]
async fn exhausted_retries_return_the_last_network_error() {
    let policy = RetryPolicy::<ClassifiedError>::builder()
        .max_attempts(3)
        .fixed_backoff(Duration::from_millis(10))
        .build();
    let calls = AtomicUsize::new(0);
    let started = tokio::time::Instant::now();

    let err = policy
        .execute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(network_error()) }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(err.category(), ErrorCategory::Network);
    assert_eq!(err.message(), "upstream connection reset");
    // Two fixed waits between three attempts.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(20), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(30), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn validation_errors_short_circuit() {
    let policy = RetryPolicy::<ClassifiedError>::builder()
        .max_attempts(10)
        .fixed_backoff(Duration::from_millis(10))
        .build();
    let calls = AtomicUsize::new(0);

    let err = policy
        .execute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<(), _>(classify(
                    BackendFailure::new("value out of range").code("23514"),
                ))
            }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert!(!err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn retry_hooks_see_every_failed_attempt() {
    let retried = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&retried);
    let policy = RetryPolicy::<ClassifiedError>::builder()
        .max_attempts(4)
        .fixed_backoff(Duration::from_millis(5))
        .on_retry(move |err, attempt, delay| {
            sink.lock()
                .unwrap()
                .push((err.category(), attempt, delay));
        })
        .build();

    let calls = AtomicUsize::new(0);
    let value = policy
        .execute(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(network_error())
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(value, 2);
    assert_eq!(
        *retried.lock().unwrap(),
        vec![
            (ErrorCategory::Network, 1, Duration::from_millis(5)),
            (ErrorCategory::Network, 2, Duration::from_millis(5)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn wrapped_services_retry_each_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let policy = RetryPolicyBuilder::<ClassifiedError>::new()
        .max_attempts(3)
        .no_backoff()
        .build();

    let service = wrap(
        move |id: u32| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(network_error())
                } else {
                    Ok(id + 1)
                }
            }
        },
        policy,
    );

    assert_eq!(service.oneshot(41).await.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

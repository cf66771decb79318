//! Retry executor for the resilient backend client.
//!
//! A [`RetryPolicy`] runs an async operation until it succeeds, fails with
//! an error the policy refuses to retry, or runs out of attempts. Delays
//! between attempts follow a [`BackoffStrategy`]:
//!
//! - `None`: retry immediately
//! - `Fixed`: constant `base_delay`
//! - `Exponential`: `base_delay * 2^(attempt - 1)`, capped at `max_delay`
//! - `ExponentialJitter`: a random delay below the exponential ceiling
//!   ([`Jitter::Full`] or [`Jitter::Half`])
//!
//! Policies built with [`RetryPolicy::builder`] only retry errors whose
//! [`Retryable::is_retryable`](backend_resilience_errors::Retryable) says
//! so; with classified errors that means network and rate-limit failures,
//! transient database conditions, and server-side status codes.
//!
//! The same policy can wrap a Tower service through [`RetryLayer`] or an
//! async function through [`wrap`].
//!
//! # Examples
//!
//! ```
//! use backend_resilience_errors::{classify, ClassifiedError};
//! use backend_resilience_retry::{BackoffStrategy, RetryPolicy};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let policy = RetryPolicy::<ClassifiedError>::builder()
//!     .max_attempts(3)
//!     .strategy(BackoffStrategy::Fixed)
//!     .base_delay(Duration::from_millis(5))
//!     .on_retry(|err, attempt, delay| {
//!         println!("attempt {attempt} failed ({err}), retrying in {delay:?}");
//!     })
//!     .build();
//!
//! let result: Result<(), ClassifiedError> = policy
//!     .execute(|| async { Err(classify("connection refused")) })
//!     .await;
//! assert!(result.is_err());
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `metrics`: `retry_calls_total` and `retry_attempts_total` counters
//! - `tracing`: debug logs for every retry, a warning on exhaustion
//! - `serde`: (de)serialize [`BackoffStrategy`] and [`Jitter`]

mod backoff;
mod config;
mod events;
mod layer;
mod policy;

pub use backoff::{Backoff, BackoffStrategy, FnInterval, IntervalFunction, Jitter};
pub use config::{RetryPolicyBuilder, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY};
pub use events::RetryEvent;
pub use layer::RetryLayer;
pub use policy::{with_retry, RetryHook, RetryPolicy, RetryPredicate};

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::util::ServiceFn;
use tower::{Service, ServiceExt};

/// A Tower [`Service`] that retries failed requests according to a
/// [`RetryPolicy`].
///
/// Every attempt runs on a fresh clone of the inner service, so readiness is
/// driven per attempt.
pub struct Retry<S, E> {
    inner: S,
    policy: Arc<RetryPolicy<E>>,
}

impl<S, E> Retry<S, E> {
    /// Wraps `inner`.
    pub fn new(inner: S, policy: Arc<RetryPolicy<E>>) -> Self {
        Self { inner, policy }
    }

    /// The policy applied to every call.
    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }
}

impl<S, E> Clone for Retry<S, E>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<S, Req, E> Service<Req> for Retry<S, E>
where
    S: Service<Req, Error = E> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    Req: Clone + Send + 'static,
    E: Send + 'static,
{
    type Response = S::Response;
    type Error = E;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let service = self.inner.clone();
        let policy = Arc::clone(&self.policy);

        Box::pin(async move {
            policy
                .execute(move || service.clone().oneshot(req.clone()))
                .await
        })
    }
}

/// Wraps an async function in a retrying Tower service.
///
/// # Examples
///
/// ```
/// use backend_resilience_retry::{wrap, RetryPolicyBuilder};
/// use tower::ServiceExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = RetryPolicyBuilder::<std::io::Error>::new().no_backoff().build();
/// let service = wrap(|id: u32| async move { Ok::<_, std::io::Error>(id * 2) }, policy);
///
/// assert_eq!(service.oneshot(21).await.unwrap(), 42);
/// # }
/// ```
pub fn wrap<F, Req, Fut, T, E>(f: F, policy: RetryPolicy<E>) -> Retry<ServiceFn<F>, E>
where
    F: FnMut(Req) -> Fut + Clone,
    Fut: Future<Output = Result<T, E>>,
{
    Retry::new(tower::service_fn(f), Arc::new(policy))
}

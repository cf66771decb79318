use crate::{Retry, RetryPolicy};
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that wraps services in [`Retry`].
///
/// # Examples
///
/// ```
/// use backend_resilience_retry::{RetryLayer, RetryPolicyBuilder};
/// use tower::ServiceBuilder;
/// use std::time::Duration;
///
/// # #[derive(Debug, Clone)]
/// # struct MyError;
/// let policy = RetryPolicyBuilder::<MyError>::new()
///     .max_attempts(5)
///     .exponential_backoff(Duration::from_millis(100))
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(RetryLayer::new(policy))
///     .service(tower::service_fn(|req: String| async move {
///         Ok::<_, MyError>(req)
///     }));
/// ```
pub struct RetryLayer<E> {
    policy: Arc<RetryPolicy<E>>,
}

impl<E> RetryLayer<E> {
    /// Creates a layer applying `policy`.
    pub fn new(policy: RetryPolicy<E>) -> Self {
        Self::shared(Arc::new(policy))
    }

    /// Creates a layer from a policy shared with other callers.
    pub fn shared(policy: Arc<RetryPolicy<E>>) -> Self {
        Self { policy }
    }
}

impl<E> Clone for RetryLayer<E> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<S, E> Layer<S> for RetryLayer<E> {
    type Service = Retry<S, E>;

    fn layer(&self, service: S) -> Self::Service {
        Retry::new(service, Arc::clone(&self.policy))
    }
}

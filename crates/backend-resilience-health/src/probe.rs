use std::future::Future;

/// A cheap connectivity check run by the monitor.
///
/// Returns `true` when the backend answered. Closures returning a future of
/// `bool` implement this trait.
///
/// # Examples
///
/// ```
/// use backend_resilience_health::HealthProbe;
///
/// struct PingProbe;
///
/// impl HealthProbe for PingProbe {
///     async fn check(&self) -> bool {
///         true
///     }
/// }
///
/// fn assert_probe<P: HealthProbe>(_: &P) {}
/// assert_probe(&PingProbe);
/// assert_probe(&|| async { false });
/// ```
pub trait HealthProbe: Send + Sync + 'static {
    /// Runs one probe.
    fn check(&self) -> impl Future<Output = bool> + Send;
}

impl<F, Fut> HealthProbe for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send,
{
    fn check(&self) -> impl Future<Output = bool> + Send {
        (self)()
    }
}

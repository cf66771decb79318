/// Errors returned by the health monitor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    /// The configuration violates a timing invariant.
    #[error("invalid monitor configuration: {0}")]
    InvalidConfig(String),
}

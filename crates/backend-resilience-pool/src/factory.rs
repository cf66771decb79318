use backend_resilience_errors::ClassifiedError;
use std::future::Future;

/// Opens, checks and closes backend connections for a pool.
///
/// # Examples
///
/// ```
/// use backend_resilience_errors::ClassifiedError;
/// use backend_resilience_pool::ConnectionFactory;
///
/// struct Session {
///     endpoint: String,
/// }
///
/// struct SessionFactory;
///
/// impl ConnectionFactory for SessionFactory {
///     type Connection = Session;
///
///     async fn connect(&self) -> Result<Session, ClassifiedError> {
///         Ok(Session { endpoint: "https://db.example.com".to_string() })
///     }
/// }
/// ```
pub trait ConnectionFactory: Send + Sync + 'static {
    /// The pooled handle.
    type Connection: Send + Sync + 'static;

    /// Opens a new connection.
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, ClassifiedError>> + Send;

    /// Cheap liveness check run before an idle connection is lent out.
    fn validate(&self, _conn: &Self::Connection) -> impl Future<Output = bool> + Send {
        async { true }
    }

    /// Releases backend resources held by a connection the pool discards.
    fn close(&self, _conn: &Self::Connection) -> impl Future<Output = ()> + Send {
        async {}
    }
}

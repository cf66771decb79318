use crate::config::ClientConfig;
use crate::error::{ClientBuildError, ConfigError};
use backend_resilience_core::EventListeners;
use backend_resilience_errors::{classify, ClassifiedError, Failure};
use backend_resilience_health::{
    ConnectionStatus, HealthMonitor, HealthProbe, LogEntry, MonitorEvent, StatusStream,
    Unsubscribe,
};
use backend_resilience_pool::{ConnectionFactory, ConnectionPool, PoolError, PoolEvent, PoolStats};
use backend_resilience_retry::RetryPolicy;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};

#[cfg(feature = "metrics")]
static METRICS_INIT: std::sync::Once = std::sync::Once::new();

type DynProbe = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

fn erase_probe<P: HealthProbe>(probe: P) -> DynProbe {
    let probe = Arc::new(probe);
    Arc::new(move || {
        let probe = Arc::clone(&probe);
        Box::pin(async move { probe.check().await })
    })
}

/// Probe used when none is configured: open a dedicated connection through
/// the pool's factory, validate it and close it again.
///
/// Reaches the backend on every check and leaves the pool's capacity alone.
fn factory_probe<F: ConnectionFactory>(pool: ConnectionPool<F>) -> DynProbe {
    Arc::new(move || {
        let pool = pool.clone();
        Box::pin(async move {
            let factory = pool.factory();
            let conn = match factory.connect().await {
                Ok(conn) => conn,
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(pool = %pool.config().name, error = %_err, "health check could not connect");
                    return false;
                }
            };
            let valid = factory.validate(&conn).await;
            factory.close(&conn).await;
            valid
        })
    })
}

struct ClientInner<F: ConnectionFactory> {
    config: ClientConfig,
    pool: ConnectionPool<F>,
    monitor: HealthMonitor,
    retry: RetryPolicy<ClassifiedError>,
}

/// Entry point for running backend operations with classification, retries,
/// pooled connections and health monitoring.
///
/// Cloning is cheap and every clone shares the same pool and monitor.
///
/// # Examples
///
/// ```
/// use backend_resilience::{ClientConfig, ResilientClient};
/// use backend_resilience::errors::ClassifiedError;
/// use backend_resilience::pool::ConnectionFactory;
///
/// struct Session;
/// struct Sessions;
///
/// impl ConnectionFactory for Sessions {
///     type Connection = Session;
///
///     async fn connect(&self) -> Result<Session, ClassifiedError> {
///         Ok(Session)
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ResilientClient::builder()
///     .config(ClientConfig::builder().name("orders").build())
///     .factory(Sessions)
///     .probe(|| async { true })
///     .build()
///     .await?;
///
/// let rows = client
///     .execute(|_session| async { Ok::<_, std::io::Error>(vec![1, 2, 3]) })
///     .await?;
/// assert_eq!(rows.len(), 3);
///
/// client.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct ResilientClient<F: ConnectionFactory> {
    inner: Arc<ClientInner<F>>,
}

impl<F: ConnectionFactory> Clone for ResilientClient<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ConnectionFactory> fmt::Debug for ResilientClient<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientClient")
            .field("name", &self.inner.config.name)
            .field("status", &self.status())
            .field("pool", &self.pool_stats())
            .finish()
    }
}

impl<F: ConnectionFactory> ResilientClient<F> {
    /// Creates a builder.
    pub fn builder() -> ResilientClientBuilder<F> {
        ResilientClientBuilder::new()
    }

    /// Runs `operation` on a pooled connection, retrying classified
    /// retryable failures with the configured policy.
    ///
    /// One connection is leased for the whole call and returned to the pool
    /// when the call finishes, fails or is cancelled. Pool exhaustion fails
    /// immediately without running `operation`.
    pub async fn execute<T, E, Op, Fut>(&self, operation: Op) -> Result<T, ClassifiedError>
    where
        Op: FnMut(Arc<F::Connection>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        self.execute_with(&self.inner.retry, operation).await
    }

    /// Like [`execute`](Self::execute) with a caller-supplied retry policy.
    pub async fn execute_with<T, E, Op, Fut>(
        &self,
        policy: &RetryPolicy<ClassifiedError>,
        mut operation: Op,
    ) -> Result<T, ClassifiedError>
    where
        Op: FnMut(Arc<F::Connection>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        let lease = match self.inner.pool.acquire().await {
            Ok(lease) => lease,
            Err(err) => {
                let err = ClassifiedError::from(err);
                self.record_outcome(Err(&err));
                return Err(err);
            }
        };
        let handle = lease.handle();

        #[cfg(feature = "tracing")]
        tracing::debug!(client = %self.inner.config.name, connection_id = lease.id(), "executing operation");

        let result = policy
            .execute(|| {
                let attempt = operation(Arc::clone(&handle));
                async move { attempt.await.map_err(classify) }
            })
            .await;

        drop(handle);
        drop(lease);
        self.record_outcome(result.as_ref().map(|_| ()));
        result
    }

    #[cfg_attr(
        not(any(feature = "tracing", feature = "metrics")),
        allow(unused_variables)
    )]
    fn record_outcome(&self, outcome: Result<(), &ClassifiedError>) {
        match outcome {
            Ok(()) => {
                #[cfg(feature = "metrics")]
                counter!("client_executions_total", "client" => self.inner.config.name.clone(), "result" => "success")
                    .increment(1);
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    client = %self.inner.config.name,
                    category = %err.category(),
                    retryable = err.is_retryable(),
                    error = %err,
                    "operation failed"
                );

                #[cfg(feature = "metrics")]
                counter!(
                    "client_executions_total",
                    "client" => self.inner.config.name.clone(),
                    "result" => "failure",
                    "category" => err.category().label()
                )
                .increment(1);
            }
        }
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.inner.monitor.status()
    }

    /// Registers a status callback; see [`HealthMonitor::on_status_change`].
    pub fn on_status_change<C>(&self, callback: C) -> Unsubscribe
    where
        C: FnMut(ConnectionStatus) + Send + 'static,
    {
        self.inner.monitor.on_status_change(callback)
    }

    /// Stream of statuses starting with the current one.
    pub fn subscribe(&self) -> StatusStream {
        self.inner.monitor.subscribe()
    }

    /// Recent status changes, oldest first.
    pub fn connection_log(&self) -> Vec<LogEntry> {
        self.inner.monitor.connection_log()
    }

    /// Snapshot of pool occupancy.
    pub fn pool_stats(&self) -> PoolStats {
        self.inner.pool.stats()
    }

    /// Reopens the pool's connections and restarts health probing.
    pub async fn reset(&self) -> Result<(), PoolError> {
        #[cfg(feature = "tracing")]
        tracing::info!(client = %self.inner.config.name, "resetting client");

        self.inner.pool.reset().await?;
        self.inner.monitor.reset();
        Ok(())
    }

    /// Stops health probing and closes every pooled connection.
    pub async fn shutdown(&self) {
        self.inner.monitor.shutdown().await;
        self.inner.pool.close().await;

        #[cfg(feature = "tracing")]
        tracing::info!(client = %self.inner.config.name, "client shut down");
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn pool(&self) -> &ConnectionPool<F> {
        &self.inner.pool
    }

    pub fn monitor(&self) -> &HealthMonitor {
        &self.inner.monitor
    }

    /// The policy used by [`execute`](Self::execute).
    pub fn retry_policy(&self) -> &RetryPolicy<ClassifiedError> {
        &self.inner.retry
    }
}

/// Builder for [`ResilientClient`].
pub struct ResilientClientBuilder<F: ConnectionFactory> {
    config: ClientConfig,
    factory: Option<F>,
    probe: Option<DynProbe>,
    retry: Option<RetryPolicy<ClassifiedError>>,
    pool_listeners: EventListeners<PoolEvent>,
    monitor_listeners: EventListeners<MonitorEvent>,
}

impl<F: ConnectionFactory> Default for ResilientClientBuilder<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ConnectionFactory> ResilientClientBuilder<F> {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            factory: None,
            probe: None,
            retry: None,
            pool_listeners: EventListeners::new(),
            monitor_listeners: EventListeners::new(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the factory that opens backend connections. Required.
    pub fn factory(mut self, factory: F) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Sets the liveness probe.
    ///
    /// Without one, the monitor opens, validates and closes a dedicated
    /// connection through the factory on every check.
    pub fn probe<P: HealthProbe>(mut self, probe: P) -> Self {
        self.probe = Some(erase_probe(probe));
        self
    }

    /// Replaces the policy derived from [`ClientConfig::retry`].
    pub fn retry_policy(mut self, policy: RetryPolicy<ClassifiedError>) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Registers a callback for pool events.
    pub fn on_pool_event<C>(mut self, callback: C) -> Self
    where
        C: Fn(&PoolEvent) + Send + Sync + 'static,
    {
        self.pool_listeners
            .add(backend_resilience_core::FnListener::new(callback));
        self
    }

    /// Registers a callback for monitor events.
    pub fn on_monitor_event<C>(mut self, callback: C) -> Self
    where
        C: Fn(&MonitorEvent) + Send + Sync + 'static,
    {
        self.monitor_listeners
            .add(backend_resilience_core::FnListener::new(callback));
        self
    }

    /// Registers a callback run when the monitor gives up reconnecting.
    ///
    /// Receives the number of reconnection attempts made.
    pub fn on_reconnect_exhausted<C>(mut self, callback: C) -> Self
    where
        C: Fn(u32) + Send + Sync + 'static,
    {
        self.monitor_listeners.add_for(
            "reconnect_exhausted",
            backend_resilience_core::FnListener::new(move |event: &MonitorEvent| {
                if let MonitorEvent::ReconnectExhausted { attempts, .. } = event {
                    callback(*attempts);
                }
            }),
        );
        self
    }

    /// Validates the configuration, opens the pool and starts the monitor.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn build(self) -> Result<ResilientClient<F>, ClientBuildError> {
        let config = self.config.with_inherited_names();
        config.validate()?;
        let factory = self.factory.ok_or(ClientBuildError::MissingFactory)?;

        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "client_executions_total",
                "Operations run through the client, by result and failure category"
            );
        });

        let pool = ConnectionPool::with_listeners(factory, config.pool.clone(), self.pool_listeners)
            .await
            .map_err(ConfigError::from)?;

        let probe = match self.probe {
            Some(probe) => probe,
            None => factory_probe(pool.clone()),
        };
        let monitor = HealthMonitor::start_with_listeners(
            move || probe(),
            config.monitor.clone(),
            self.monitor_listeners,
        )
        .map_err(ConfigError::from)?;

        let retry = self
            .retry
            .unwrap_or_else(|| config.retry.to_policy(config.name.clone()));

        #[cfg(feature = "tracing")]
        tracing::info!(
            client = %config.name,
            max_connections = config.pool.max_connections,
            max_attempts = retry.max_attempts(),
            "client started"
        );

        Ok(ResilientClient {
            inner: Arc::new(ClientInner {
                config,
                pool,
                monitor,
                retry,
            }),
        })
    }
}

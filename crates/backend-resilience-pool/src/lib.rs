//! Bounded connection pool for the resilient backend client.
//!
//! The pool keeps between `min_connections` and `max_connections` backend
//! handles open and lends them out one caller at a time through a [`Lease`].
//! It never queues: when every handle is lent out and the pool is at
//! capacity, [`ConnectionPool::acquire`] fails immediately with
//! [`PoolError::Exhausted`]. Callers that want to wait combine `acquire` with
//! a retry policy.
//!
//! A background task evicts idle and aged handles every
//! `min(idle_timeout, 60s)` and tops the pool back up to `min_connections`.
//! Lent-out handles are never evicted, reset or closed under their borrower;
//! they are retired when they come back and count against
//! `max_connections` until then.
//!
//! # Examples
//!
//! ```
//! use backend_resilience_errors::ClassifiedError;
//! use backend_resilience_pool::{ConnectionFactory, ConnectionPool, PoolConfig};
//!
//! struct Session;
//! struct SessionFactory;
//!
//! impl ConnectionFactory for SessionFactory {
//!     type Connection = Session;
//!
//!     async fn connect(&self) -> Result<Session, ClassifiedError> {
//!         Ok(Session)
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), backend_resilience_pool::PoolError> {
//! let config = PoolConfig::builder().min_connections(1).max_connections(2).build();
//! let pool = ConnectionPool::new(SessionFactory, config).await?;
//!
//! let lease = pool.acquire().await?;
//! assert_eq!(pool.active_count(), 1);
//! drop(lease); // back in the pool
//! assert_eq!(pool.idle_count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `metrics`: acquisition counters, active/idle gauges, removal counters
//! - `tracing`: logs connection lifecycle and connect failures
//! - `serde`: (de)serialize [`PoolConfig`]

mod config;
mod error;
mod events;
mod factory;

pub use config::{PoolConfig, PoolConfigBuilder, MAX_EVICTION_INTERVAL};
pub use error::{PoolError, Result, POOL_CLOSED, POOL_EXHAUSTED};
pub use events::{PoolEvent, RemovalReason};
pub use factory::ConnectionFactory;

use backend_resilience_core::EventListeners;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, gauge};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

struct Slot<C> {
    id: u64,
    conn: Arc<C>,
    created_at: Instant,
    last_used_at: Instant,
    in_use: bool,
    /// Set on lent-out slots by `reset`/`close`; closed when released.
    retired: bool,
}

struct PoolState<C> {
    slots: Vec<Slot<C>>,
    /// Connections being opened against a reserved slot.
    pending: usize,
    closed: bool,
}

impl<C> PoolState<C> {
    fn total(&self) -> usize {
        self.slots.len() + self.pending
    }

    fn active(&self) -> usize {
        self.slots.iter().filter(|slot| slot.in_use).count()
    }

    fn idle(&self) -> usize {
        self.slots.len() - self.active()
    }

    /// Slots that will go back into circulation, plus pending opens.
    fn live(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.retired).count() + self.pending
    }

    /// Removes the idle slots and marks lent-out ones for closing on release.
    fn retire_all(&mut self) -> Vec<Slot<C>> {
        let (lent, idle): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.slots).into_iter().partition(|slot| slot.in_use);
        self.slots = lent;
        for slot in &mut self.slots {
            slot.retired = true;
        }
        idle
    }
}

struct Inner<F: ConnectionFactory> {
    factory: F,
    config: PoolConfig,
    state: Mutex<PoolState<F::Connection>>,
    next_id: AtomicU64,
    listeners: EventListeners<PoolEvent>,
    eviction_task: Mutex<Option<JoinHandle<()>>>,
}

/// Capacity reserved for a connection that is still being opened.
///
/// Dropping it without [`commit`](Reservation::commit) gives the capacity
/// back, so a cancelled `acquire` never leaks a slot.
struct Reservation<'a, F: ConnectionFactory> {
    inner: &'a Inner<F>,
    armed: bool,
}

impl<'a, F: ConnectionFactory> Reservation<'a, F> {
    /// Must be created right after `pending` was incremented.
    fn new(inner: &'a Inner<F>) -> Self {
        Self { inner, armed: true }
    }

    /// Stores `slot` in the pool. Hands it back if the pool closed meanwhile.
    fn commit(mut self, slot: Slot<F::Connection>) -> std::result::Result<(), Slot<F::Connection>> {
        self.armed = false;
        let mut state = self.inner.lock();
        state.pending -= 1;
        if state.closed {
            return Err(slot);
        }
        state.slots.push(slot);
        self.inner.record_gauges(&state);
        Ok(())
    }
}

impl<F: ConnectionFactory> Drop for Reservation<'_, F> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.lock().pending -= 1;
        }
    }
}

impl<F: ConnectionFactory> Inner<F> {
    fn lock(&self) -> MutexGuard<'_, PoolState<F::Connection>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn name(&self) -> String {
        self.config.name.clone()
    }

    fn emit(&self, event: PoolEvent) {
        self.listeners.emit(&event);
    }

    #[cfg(feature = "metrics")]
    fn record_gauges(&self, state: &PoolState<F::Connection>) {
        let active = state.active();
        gauge!("pool_connections_active", "pool" => self.name()).set(active as f64);
        gauge!("pool_connections_idle", "pool" => self.name()).set((state.slots.len() - active) as f64);
    }

    #[cfg(not(feature = "metrics"))]
    fn record_gauges(&self, _state: &PoolState<F::Connection>) {}

    fn removed(&self, id: u64, reason: RemovalReason) {
        self.emit(PoolEvent::Removed {
            pool_name: self.name(),
            timestamp: std::time::Instant::now(),
            connection_id: id,
            reason,
        });

        #[cfg(feature = "tracing")]
        debug!(pool = %self.config.name, connection_id = id, reason = reason.label(), "connection removed");

        #[cfg(feature = "metrics")]
        counter!("pool_connections_removed_total", "pool" => self.name(), "reason" => reason.label())
            .increment(1);
    }

    /// Opens a connection. Capacity must already be reserved.
    async fn open(&self) -> Result<Slot<F::Connection>> {
        match self.factory.connect().await {
            Ok(conn) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                let now = Instant::now();

                self.emit(PoolEvent::Created {
                    pool_name: self.name(),
                    timestamp: std::time::Instant::now(),
                    connection_id: id,
                });

                #[cfg(feature = "tracing")]
                debug!(pool = %self.config.name, connection_id = id, "connection opened");

                #[cfg(feature = "metrics")]
                counter!("pool_connections_created_total", "pool" => self.name()).increment(1);

                Ok(Slot {
                    id,
                    conn: Arc::new(conn),
                    created_at: now,
                    last_used_at: now,
                    in_use: false,
                    retired: false,
                })
            }
            Err(err) => {
                self.emit(PoolEvent::ConnectFailed {
                    pool_name: self.name(),
                    timestamp: std::time::Instant::now(),
                    message: err.message().to_string(),
                });

                #[cfg(feature = "tracing")]
                warn!(pool = %self.config.name, error = %err, "failed to open connection");

                Err(PoolError::Connect(err))
            }
        }
    }

    /// Opens connections until `min_connections` live ones exist, without
    /// exceeding `max_connections`. Stops at the first connect failure and
    /// returns how many were opened.
    async fn replenish(&self) -> usize {
        let mut opened = 0;
        loop {
            let reservation = {
                let mut state = self.lock();
                if state.closed
                    || state.live() >= self.config.min_connections
                    || state.total() >= self.config.max_connections
                {
                    break;
                }
                state.pending += 1;
                Reservation::new(self)
            };

            let Ok(slot) = self.open().await else {
                break;
            };
            match reservation.commit(slot) {
                Ok(()) => opened += 1,
                Err(slot) => {
                    self.factory.close(&slot.conn).await;
                    break;
                }
            }
        }
        opened
    }

    async fn evict_expired(&self) -> EvictionReport {
        let removed = {
            let mut state = self.lock();
            if state.closed {
                return EvictionReport::default();
            }

            let now = Instant::now();
            let mut kept = Vec::with_capacity(state.slots.len());
            let mut removed = Vec::new();
            for slot in state.slots.drain(..) {
                if slot.in_use {
                    kept.push(slot);
                } else if now.saturating_duration_since(slot.created_at) > self.config.max_connection_age {
                    removed.push((slot, RemovalReason::Aged));
                } else if now.saturating_duration_since(slot.last_used_at) > self.config.idle_timeout {
                    removed.push((slot, RemovalReason::Idle));
                } else {
                    kept.push(slot);
                }
            }
            state.slots = kept;
            self.record_gauges(&state);
            removed
        };

        let evicted = removed.len();
        for (slot, reason) in removed {
            self.factory.close(&slot.conn).await;
            self.removed(slot.id, reason);
        }

        let replenished = self.replenish().await;
        EvictionReport {
            evicted,
            replenished,
        }
    }

    async fn drain(&self, slots: Vec<Slot<F::Connection>>) {
        for slot in slots {
            self.factory.close(&slot.conn).await;
            self.removed(slot.id, RemovalReason::Shutdown);
        }
    }

    /// Returns a lent-out slot. False when the slot was retired by `reset`
    /// or `close` and is closed instead of pooled.
    fn release_slot(self: &Arc<Self>, id: u64) -> bool {
        let (pooled, removed) = {
            let mut state = self.lock();
            let Some(index) = state.slots.iter().position(|slot| slot.id == id && slot.in_use) else {
                return false;
            };

            let now = Instant::now();
            let slot = &state.slots[index];
            let reason = if slot.retired {
                Some(RemovalReason::Shutdown)
            } else if now.saturating_duration_since(slot.created_at) > self.config.max_connection_age {
                Some(RemovalReason::Aged)
            } else {
                None
            };
            let pooled = !slot.retired;

            let removed = match reason {
                Some(reason) => Some((state.slots.swap_remove(index), reason)),
                None => {
                    let slot = &mut state.slots[index];
                    slot.in_use = false;
                    slot.last_used_at = now;
                    None
                }
            };
            self.record_gauges(&state);
            (pooled, removed)
        };

        self.emit(PoolEvent::Released {
            pool_name: self.name(),
            timestamp: std::time::Instant::now(),
            connection_id: id,
        });

        if let Some((slot, reason)) = removed {
            self.removed(slot.id, reason);
            self.close_detached(slot);
        }
        pooled
    }

    /// Closes a slot that already left the pool, on the current runtime.
    ///
    /// Outside a runtime the factory cannot be driven; the handle is dropped
    /// unclosed and a warning is logged.
    fn close_detached(self: &Arc<Self>, slot: Slot<F::Connection>) {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let inner = Arc::clone(self);
                runtime.spawn(async move {
                    inner.factory.close(&slot.conn).await;
                });
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                warn!(
                    pool = %self.config.name,
                    connection_id = slot.id,
                    "no runtime to close a released connection; dropping it unclosed"
                );
            }
        }
    }
}

impl<F: ConnectionFactory> Drop for Inner<F> {
    fn drop(&mut self) {
        let task = self
            .eviction_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// Outcome of one eviction cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Idle or aged connections that were closed.
    pub evicted: usize,
    /// Connections opened to get back to `min_connections`.
    pub replenished: usize,
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Open connections not lent out.
    pub idle: usize,
    /// Connections currently lent out.
    pub active: usize,
    /// Connections being opened.
    pub pending: usize,
    /// Open connections (idle + active).
    pub total: usize,
    /// Configured minimum.
    pub min_connections: usize,
    /// Configured maximum.
    pub max_connections: usize,
}

impl PoolStats {
    /// Share of the capacity that is open, as a percentage.
    pub fn utilization(&self) -> f64 {
        if self.max_connections == 0 {
            0.0
        } else {
            (self.total as f64 / self.max_connections as f64) * 100.0
        }
    }
}

/// A connection lent out by a [`ConnectionPool`].
///
/// Dereferences to the connection. Dropping the lease returns the
/// connection to its pool.
pub struct Lease<F: ConnectionFactory> {
    pool: Arc<Inner<F>>,
    id: u64,
    conn: Arc<F::Connection>,
    released: bool,
}

impl<F: ConnectionFactory> Lease<F> {
    /// Pool-unique id of the leased connection.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Shared handle to the connection.
    ///
    /// The handle must not be used after the lease is dropped; another
    /// caller may hold the connection by then.
    pub fn handle(&self) -> Arc<F::Connection> {
        Arc::clone(&self.conn)
    }

    fn release_now(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.pool.release_slot(self.id)
    }

    /// Removes the leased connection from the pool and reserves its capacity
    /// for a replacement.
    fn discard(&mut self) -> Result<Option<Arc<F::Connection>>> {
        self.released = true;
        let mut state = self.pool.lock();
        if state.closed {
            return Err(PoolError::Closed);
        }
        let stale = match state.slots.iter().position(|slot| slot.id == self.id) {
            Some(index) => Some(state.slots.swap_remove(index).conn),
            None if state.total() < self.pool.config.max_connections => None,
            None => {
                return Err(PoolError::Exhausted {
                    max_connections: self.pool.config.max_connections,
                })
            }
        };
        state.pending += 1;
        Ok(stale)
    }
}

impl<F: ConnectionFactory> Deref for Lease<F> {
    type Target = F::Connection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<F: ConnectionFactory> Drop for Lease<F> {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl<F: ConnectionFactory> fmt::Debug for Lease<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("pool", &self.pool.config.name)
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

/// A bounded pool of backend connections.
///
/// Cloning is cheap; clones share the same pool.
pub struct ConnectionPool<F: ConnectionFactory> {
    inner: Arc<Inner<F>>,
}

impl<F: ConnectionFactory> Clone for ConnectionPool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ConnectionFactory> fmt::Debug for ConnectionPool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<F: ConnectionFactory> ConnectionPool<F> {
    /// Creates a pool, opens `min_connections` connections and starts the
    /// eviction task.
    ///
    /// Connect failures while warming up are logged and reported as events;
    /// the pool still starts and retries on the next `acquire` or eviction
    /// cycle.
    pub async fn new(factory: F, config: PoolConfig) -> Result<Self> {
        Self::with_listeners(factory, config, EventListeners::new()).await
    }

    /// Like [`new`](Self::new), delivering [`PoolEvent`]s to `listeners`.
    pub async fn with_listeners(
        factory: F,
        config: PoolConfig,
        listeners: EventListeners<PoolEvent>,
    ) -> Result<Self> {
        config.validate()?;

        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_gauge!("pool_connections_active", "Connections currently lent out");
            describe_gauge!("pool_connections_idle", "Open connections waiting to be lent out");
            describe_counter!(
                "pool_acquire_total",
                "Total acquisitions by result (ok, exhausted, error)"
            );
            describe_counter!("pool_connections_created_total", "Total connections opened");
            describe_counter!(
                "pool_connections_removed_total",
                "Total connections closed by reason (idle, aged, invalid, shutdown)"
            );
        });

        let interval = config.eviction_interval();
        let inner = Arc::new(Inner {
            factory,
            config,
            state: Mutex::new(PoolState {
                slots: Vec::new(),
                pending: 0,
                closed: false,
            }),
            next_id: AtomicU64::new(0),
            listeners,
            eviction_task: Mutex::new(None),
        });

        inner.replenish().await;

        let task = tokio::spawn(eviction_loop(Arc::downgrade(&inner), interval));
        *inner
            .eviction_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(task);

        Ok(Self { inner })
    }

    /// Lends out a connection.
    ///
    /// Picks an idle connection, or opens one while below
    /// `max_connections`. With `validate_on_borrow`, an idle connection that
    /// fails validation is closed and replaced before this returns.
    ///
    /// # Errors
    ///
    /// - [`PoolError::Exhausted`] when every connection is lent out and the
    ///   pool is at capacity
    /// - [`PoolError::Connect`] when a new connection could not be opened
    /// - [`PoolError::Closed`] after [`close`](Self::close)
    pub async fn acquire(&self) -> Result<Lease<F>> {
        let result = self.try_acquire().await;

        match &result {
            Ok(lease) => {
                self.inner.emit(PoolEvent::Acquired {
                    pool_name: self.inner.name(),
                    timestamp: std::time::Instant::now(),
                    connection_id: lease.id,
                });

                #[cfg(feature = "metrics")]
                counter!("pool_acquire_total", "pool" => self.inner.name(), "result" => "ok").increment(1);
            }
            Err(PoolError::Exhausted { max_connections }) => {
                self.inner.emit(PoolEvent::Exhausted {
                    pool_name: self.inner.name(),
                    timestamp: std::time::Instant::now(),
                    max_connections: *max_connections,
                });

                #[cfg(feature = "tracing")]
                debug!(pool = %self.inner.config.name, "connection pool exhausted");

                #[cfg(feature = "metrics")]
                counter!("pool_acquire_total", "pool" => self.inner.name(), "result" => "exhausted")
                    .increment(1);
            }
            Err(_) => {
                #[cfg(feature = "metrics")]
                counter!("pool_acquire_total", "pool" => self.inner.name(), "result" => "error")
                    .increment(1);
            }
        }

        result
    }

    async fn try_acquire(&self) -> Result<Lease<F>> {
        let inner = &self.inner;

        let idle = {
            let mut state = inner.lock();
            if state.closed {
                return Err(PoolError::Closed);
            }

            match state.slots.iter().position(|slot| !slot.in_use) {
                Some(index) => {
                    let slot = &mut state.slots[index];
                    slot.in_use = true;
                    slot.last_used_at = Instant::now();
                    let picked = (slot.id, Arc::clone(&slot.conn));
                    inner.record_gauges(&state);
                    Some(picked)
                }
                None if state.total() < inner.config.max_connections => {
                    state.pending += 1;
                    None
                }
                None => {
                    return Err(PoolError::Exhausted {
                        max_connections: inner.config.max_connections,
                    })
                }
            }
        };

        let Some((id, conn)) = idle else {
            return self.open_reserved(Reservation::new(inner)).await;
        };

        let mut lease = self.lease(id, conn);
        if !inner.config.validate_on_borrow || inner.factory.validate(lease.conn.as_ref()).await {
            return Ok(lease);
        }

        let stale = lease.discard()?;
        let reservation = Reservation::new(inner);
        if let Some(stale) = stale {
            inner.factory.close(&stale).await;
            inner.removed(id, RemovalReason::Invalid);
        }
        self.open_reserved(reservation).await
    }

    async fn open_reserved(&self, reservation: Reservation<'_, F>) -> Result<Lease<F>> {
        let mut slot = self.inner.open().await?;
        slot.in_use = true;
        slot.last_used_at = Instant::now();
        let (id, conn) = (slot.id, Arc::clone(&slot.conn));

        match reservation.commit(slot) {
            Ok(()) => Ok(self.lease(id, conn)),
            Err(slot) => {
                self.inner.factory.close(&slot.conn).await;
                Err(PoolError::Closed)
            }
        }
    }

    fn lease(&self, id: u64, conn: Arc<F::Connection>) -> Lease<F> {
        Lease {
            pool: Arc::clone(&self.inner),
            id,
            conn,
            released: false,
        }
    }

    /// Returns a leased connection.
    ///
    /// Returns false if the lease does not belong to this pool (it then goes
    /// back to its own pool) or its connection was retired by
    /// [`reset`](Self::reset) or [`close`](Self::close) and is closed now.
    pub fn release(&self, mut lease: Lease<F>) -> bool {
        if !Arc::ptr_eq(&lease.pool, &self.inner) {
            return false;
        }
        lease.release_now()
    }

    /// Closes idle connections past their idle timeout or maximum age, then
    /// tops the pool up to `min_connections`.
    ///
    /// Runs automatically every [`PoolConfig::eviction_interval`].
    pub async fn evict_expired(&self) -> EvictionReport {
        self.inner.evict_expired().await
    }

    /// Closes every idle connection and reopens up to `min_connections`
    /// fresh ones.
    ///
    /// Lent-out connections stay open for their borrowers. They are closed
    /// when returned (`release` then reports false) and keep counting against
    /// `max_connections` until then. Returns how many connections were
    /// reopened.
    pub async fn reset(&self) -> Result<usize> {
        let slots = {
            let mut state = self.inner.lock();
            if state.closed {
                return Err(PoolError::Closed);
            }
            let slots = state.retire_all();
            self.inner.record_gauges(&state);
            slots
        };

        #[cfg(feature = "tracing")]
        debug!(pool = %self.inner.config.name, dropped = slots.len(), "resetting connection pool");

        self.inner.drain(slots).await;
        Ok(self.inner.replenish().await)
    }

    /// Stops the eviction task and closes every idle connection.
    ///
    /// Lent-out connections stay open for their borrowers and are closed
    /// when returned. Later calls to `acquire` fail with
    /// [`PoolError::Closed`].
    pub async fn close(&self) {
        let slots = {
            let mut state = self.inner.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            let slots = state.retire_all();
            self.inner.record_gauges(&state);
            slots
        };

        let task = self
            .inner
            .eviction_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }

        self.inner.drain(slots).await;
    }

    /// Returns true once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Open connections, lent out or not.
    pub fn size(&self) -> usize {
        self.inner.lock().slots.len()
    }

    /// Connections currently lent out.
    pub fn active_count(&self) -> usize {
        self.inner.lock().active()
    }

    /// Open connections waiting to be lent out.
    pub fn idle_count(&self) -> usize {
        self.inner.lock().idle()
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.lock();
        let active = state.active();
        PoolStats {
            idle: state.slots.len() - active,
            active,
            pending: state.pending,
            total: state.slots.len(),
            min_connections: self.inner.config.min_connections,
            max_connections: self.inner.config.max_connections,
        }
    }

    /// The pool configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// The connection factory.
    pub fn factory(&self) -> &F {
        &self.inner.factory
    }
}

async fn eviction_loop<F: ConnectionFactory>(pool: Weak<Inner<F>>, period: std::time::Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(inner) = pool.upgrade() else {
            break;
        };
        let _report = inner.evict_expired().await;

        #[cfg(feature = "tracing")]
        if _report.evicted > 0 || _report.replenished > 0 {
            debug!(
                pool = %inner.config.name,
                evicted = _report.evicted,
                replenished = _report.replenished,
                "eviction cycle finished"
            );
        }
    }
}

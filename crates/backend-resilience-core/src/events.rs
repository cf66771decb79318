//! Event plumbing shared by the client components.
//!
//! The retry policy, the connection pool and the health monitor each report
//! what they do as a typed event (`RetryEvent`, `PoolEvent`, `MonitorEvent`).
//! Callers register listeners for every event of a component, or only for
//! one event type such as `"reconnect_exhausted"`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// An event emitted by one of the client components.
pub trait ClientEvent: Send + Sync + fmt::Debug {
    /// Short machine-readable name of the event, e.g. `"retry"` or `"acquired"`.
    fn event_type(&self) -> &'static str;

    /// When the event happened.
    fn timestamp(&self) -> Instant;

    /// Name of the component instance that emitted the event.
    fn source_name(&self) -> &str;
}

/// Receives events of type `E`.
pub trait EventListener<E: ClientEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

/// Shared listener handle.
pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

struct Registration<E: ClientEvent> {
    /// `None` receives everything.
    event_type: Option<&'static str>,
    listener: BoxedEventListener<E>,
}

impl<E: ClientEvent> Registration<E> {
    fn accepts(&self, event: &E) -> bool {
        self.event_type
            .map_or(true, |wanted| wanted == event.event_type())
    }
}

impl<E: ClientEvent> Clone for Registration<E> {
    fn clone(&self) -> Self {
        Self {
            event_type: self.event_type,
            listener: Arc::clone(&self.listener),
        }
    }
}

/// Listeners of one component, delivered in registration order.
///
/// A listener that panics is skipped for that event and counted in
/// [`panicked`](Self::panicked); delivery continues with the next one.
/// Clones share the listeners registered so far and the panic counter.
pub struct EventListeners<E: ClientEvent> {
    registrations: Vec<Registration<E>>,
    panics: Arc<AtomicU64>,
}

impl<E: ClientEvent> Clone for EventListeners<E> {
    fn clone(&self) -> Self {
        Self {
            registrations: self.registrations.clone(),
            panics: Arc::clone(&self.panics),
        }
    }
}

impl<E: ClientEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            panics: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registers a listener for every event.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.register(None, listener);
    }

    /// Registers a listener that only sees events whose
    /// [`event_type`](ClientEvent::event_type) equals `event_type`.
    pub fn add_for<L>(&mut self, event_type: &'static str, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.register(Some(event_type), listener);
    }

    fn register<L>(&mut self, event_type: Option<&'static str>, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.registrations.push(Registration {
            event_type,
            listener: Arc::new(listener),
        });
    }

    /// Delivers `event` to every interested listener.
    pub fn emit(&self, event: &E) {
        for registration in self.registrations.iter().filter(|r| r.accepts(event)) {
            let delivered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                registration.listener.on_event(event)
            }));
            if delivered.is_ok() {
                continue;
            }

            let total = self.panics.fetch_add(1, Ordering::Relaxed) + 1;

            #[cfg(feature = "tracing")]
            tracing::warn!(
                source = event.source_name(),
                event = event.event_type(),
                total_panics = total,
                "event listener panicked"
            );
            #[cfg(not(feature = "tracing"))]
            let _ = total;
        }
    }

    /// Listener invocations that panicked so far.
    pub fn panicked(&self) -> u64 {
        self.panics.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }
}

impl<E: ClientEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ClientEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filtered = self
            .registrations
            .iter()
            .filter(|r| r.event_type.is_some())
            .count();
        f.debug_struct("EventListeners")
            .field("len", &self.registrations.len())
            .field("filtered", &filtered)
            .field("panicked", &self.panicked())
            .finish()
    }
}

/// Turns a closure into an [`EventListener`].
pub struct FnListener<E, F> {
    callback: F,
    _event: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _event: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: ClientEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.callback)(event)
    }
}

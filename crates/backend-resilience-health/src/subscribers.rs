use crate::ConnectionStatus;
use futures::Stream;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Mutex, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

pub(crate) type StatusCallback = Box<dyn FnMut(ConnectionStatus) + Send>;

/// Registered status observers.
///
/// Notification happens while the registry lock is held, so observers see
/// transitions one at a time and in order. A callback must not register or
/// remove observers on the monitor that is calling it.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    callbacks: Vec<(u64, StatusCallback)>,
    streams: Vec<mpsc::UnboundedSender<ConnectionStatus>>,
}

impl Subscribers {
    pub(crate) fn add_callback(
        &mut self,
        current: ConnectionStatus,
        mut callback: StatusCallback,
    ) -> u64 {
        invoke(&mut callback, current);
        let id = self.next_id;
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    pub(crate) fn add_stream(&mut self, current: ConnectionStatus) -> StatusStream {
        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is alive, so this send cannot fail.
        let _ = tx.send(current);
        self.streams.push(tx);
        StatusStream { rx }
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    pub(crate) fn notify(&mut self, status: ConnectionStatus) {
        for (_, callback) in self.callbacks.iter_mut() {
            invoke(callback, status);
        }
        self.streams.retain(|tx| tx.send(status).is_ok());
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.len() + self.streams.iter().filter(|tx| !tx.is_closed()).count()
    }
}

fn invoke(callback: &mut StatusCallback, status: ConnectionStatus) {
    if catch_unwind(AssertUnwindSafe(|| callback(status))).is_err() {
        #[cfg(feature = "tracing")]
        tracing::warn!(status = %status, "status callback panicked");
    }
}

/// Handle returned by [`HealthMonitor::on_status_change`](crate::HealthMonitor::on_status_change).
///
/// Dropping the handle keeps the callback registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[must_use = "dropping the handle leaves the callback registered"]
#[derive(Debug)]
pub struct Unsubscribe {
    registry: Weak<Mutex<Subscribers>>,
    id: u64,
}

impl Unsubscribe {
    pub(crate) fn new(registry: Weak<Mutex<Subscribers>>, id: u64) -> Self {
        Self { registry, id }
    }

    /// Removes the callback. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(self.id),
            None => false,
        }
    }
}

/// Stream of status changes.
///
/// The first item is the status at the time of subscription. The stream ends
/// when the monitor is dropped.
#[derive(Debug)]
pub struct StatusStream {
    rx: mpsc::UnboundedReceiver<ConnectionStatus>,
}

impl StatusStream {
    /// Waits for the next status.
    pub async fn recv(&mut self) -> Option<ConnectionStatus> {
        self.rx.recv().await
    }
}

impl Stream for StatusStream {
    type Item = ConnectionStatus;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("callbacks", &self.callbacks.len())
            .field("streams", &self.streams.len())
            .finish()
    }
}

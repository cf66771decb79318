//! Shared infrastructure for the resilient backend client.
//!
//! Every component of the client (retry executor, connection pool, health
//! monitor) reports what it does through the same small event system so that
//! applications can attach one kind of listener everywhere.

pub mod events;

pub use events::{ClientEvent, EventListener, EventListeners, FnListener};

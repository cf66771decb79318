//! Test organization:
//! - common.rs: shared factories and helpers
//! - retry.rs: retry executor scenarios
//! - pool.rs: pool exhaustion, recovery and concurrent lending
//! - health.rs: monitor reconnection and transition legality
//! - client.rs: facade scenarios

mod client;
mod common;
mod health;
mod pool;
mod retry;

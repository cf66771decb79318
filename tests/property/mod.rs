//! Property-based tests for the resilient backend client.
//!
//! Run with: cargo test --test property_tests

pub mod backoff;
pub mod classifier;
pub mod pool;

/// Current-thread runtime with a paused clock so backoff sleeps cost nothing.
pub fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

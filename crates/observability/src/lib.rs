//! Tracing setup shared by dispatching processes and queue workers.

/// Initialize process-wide tracing (JSON, `RUST_LOG`-filtered).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize tracing for tests (human-readable, captured by the test harness).
pub fn init_for_tests() {
    tracing::init_for_tests();
}

/// Subscriber configuration.
pub mod tracing;

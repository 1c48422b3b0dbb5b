//! Tracing and logging setup shared by every binary that hosts the sales service.

/// Initialize process-wide tracing/logging.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize tracing for test binaries. Safe to call from every test.
pub fn init_for_tests() {
    let _ = tracing::try_init_for_tests();
}

/// Tracing configuration (filters, formatting).
pub mod tracing;

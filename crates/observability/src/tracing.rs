//! Tracing/logging initialization.
//!
//! JSON lines on stdout with timestamps. Verbosity comes from `RUST_LOG`
//! (e.g. `RUST_LOG=salesdesk_infra=debug`), defaulting to `info`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

/// Filter from `RUST_LOG`, or [`DEFAULT_FILTER`] when unset or unparsable.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Returns `false` when one was already installed.
pub fn try_init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init()
        .is_ok()
}

pub fn init() {
    let _ = try_init();
}

/// Same subscriber, written through the test harness so output is captured
/// per test and shown only for failures.
pub fn try_init_for_tests() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .json()
        .with_target(false)
        .with_test_writer()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        assert!(!try_init());
        assert!(!try_init_for_tests());
        ::tracing::info!(sale_id = "test", "subscriber installed");
    }
}

//! Logger setup for binaries and tests.
//!
//! The library only logs through the `log` facade; whoever drives it picks
//! the backend. `RUST_LOG` takes precedence over the configured filter.

use env_logger::{Builder, Env};

/// Initialize `env_logger` with `filter` as the default level
///
/// Calling it more than once is harmless; later calls are ignored.
pub fn init(filter: &str) {
    let _ = Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init();
}

/// Logger for unit tests; output is captured per test
pub fn init_for_tests() {
    let _ = Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

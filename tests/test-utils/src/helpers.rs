//! Test helper functions

use tracing_subscriber::EnvFilter;

/// Initialize test logging with environment-based configuration.
///
/// Honours `RUST_LOG` and writes through the test harness so output is only
/// shown for failing tests. Safe to call multiple times.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

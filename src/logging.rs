//! Logging init: `env_logger` on stderr, filter from `RUST_LOG`.

use env_logger::Env;

const DEFAULT_FILTER: &str = "info";

/// Initialize logging. Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let result = env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .format_timestamp_millis()
        .try_init();

    if result.is_ok() {
        log::info!("QR Studio logging initialized");
    }
}

//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

use crate::core::config::LoggingConfig;

/// Initialize the logging system from `RUST_LOG`
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize the logging system with the level from a config,
/// still letting `RUST_LOG` override it
pub fn init_with_level(config: &LoggingConfig) {
    let _ = env_logger::Builder::new()
        .parse_filters(&config.level)
        .parse_default_env()
        .try_init();
}

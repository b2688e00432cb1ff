//! Shared functionality for the reliagram command-line tools.

pub mod config;
pub mod stats;

pub use config::{Config, ConfigError, EndpointConfig, RetryConfig};
pub use stats::{display_compact_stats, format_bytes, format_duration, format_rate};

use tracing::Level;

/// Install the global log subscriber for a CLI tool.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .ok();
}

//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use zeke_core::DEFAULT_LOG_LEVEL;

/// Filter from `RUST_LOG`, falling back to `level` and then to `info`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .compact()
        .init();
}

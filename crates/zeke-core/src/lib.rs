#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod retry;
pub mod ring_log;
pub mod tool_result;

// Re-export commonly used types for convenience
pub use config::{
    ConfigError, DEFAULT_CHAT_URL, DEFAULT_LOG_LEVEL, DEFAULT_PORT, DEFAULT_READER_URL,
    DEFAULT_SEARCH_URL, GatewayConfig,
};
pub use error::GatewayError;
pub use retry::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT, RetryPolicy,
};
pub use ring_log::{DEFAULT_ERROR_LOG_CAPACITY, ErrorRing, MAX_SNIPPET_CHARS, RingLogEntry, snippet};
pub use tool_result::ToolResult;

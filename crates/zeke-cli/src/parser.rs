//! Command-line and environment configuration.

use clap::Parser;
use std::time::Duration;

use zeke_core::{
    DEFAULT_BASE_DELAY, DEFAULT_CHAT_URL, DEFAULT_ERROR_LOG_CAPACITY, DEFAULT_LOG_LEVEL,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_PORT, DEFAULT_READER_URL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SEARCH_URL, GatewayConfig, RetryPolicy,
};

#[allow(clippy::cast_possible_truncation)]
const DEFAULT_BASE_DELAY_MS: u64 = DEFAULT_BASE_DELAY.as_millis() as u64;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = DEFAULT_REQUEST_TIMEOUT.as_secs();

/// MCP tool gateway and GLM chat-completion proxy for Z.AI.
///
/// Every flag can also be set through the environment variable shown in
/// `--help`; a `.env` file in the working directory is read first.
#[derive(Debug, Parser)]
#[command(name = "zeke-bridge")]
#[command(version)]
pub struct Cli {
    /// Z.AI API key sent upstream as a bearer token
    #[arg(long, env = "Z_AI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Web search MCP endpoint
    #[arg(long, env = "ZAI_MCP_SEARCH_URL", default_value = DEFAULT_SEARCH_URL)]
    pub search_url: String,

    /// Web reader MCP endpoint
    #[arg(long, env = "ZAI_MCP_READER_URL", default_value = DEFAULT_READER_URL)]
    pub reader_url: String,

    /// GLM chat-completion endpoint
    #[arg(long, env = "ZAI_GLM_CODING_URL", default_value = DEFAULT_CHAT_URL)]
    pub chat_url: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Upstream attempts per call, including the first
    #[arg(long, env = "ZEKE_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds
    #[arg(long, env = "ZEKE_BASE_DELAY_MS", default_value_t = DEFAULT_BASE_DELAY_MS)]
    pub base_delay_ms: u64,

    /// Per-attempt timeout in seconds
    #[arg(long, env = "ZEKE_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Upstream failures kept for /debug/last-errors (0 disables)
    #[arg(long, env = "ZEKE_ERROR_LOG_CAPACITY", default_value_t = DEFAULT_ERROR_LOG_CAPACITY)]
    pub error_log_capacity: usize,
}

impl Cli {
    pub fn into_config(self) -> GatewayConfig {
        let retry = RetryPolicy::new()
            .with_max_attempts(self.max_attempts)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs));

        GatewayConfig::new(self.api_key)
            .with_search_url(self.search_url)
            .with_reader_url(self.reader_url)
            .with_chat_url(self.chat_url)
            .with_port(self.port)
            .with_log_level(self.log_level)
            .with_retry(retry)
            .with_error_log_capacity(self.error_log_capacity)
    }
}

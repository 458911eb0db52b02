//! Gateway configuration.
//!
//! A plain struct handed to constructors. Reading it from the environment is
//! the binary's job; nothing in the core crates looks at env vars.

use std::fmt;

use thiserror::Error;

use crate::retry::RetryPolicy;
use crate::ring_log::DEFAULT_ERROR_LOG_CAPACITY;

pub const DEFAULT_SEARCH_URL: &str = "https://api.z.ai/api/mcp/web_search_prime/mcp";
pub const DEFAULT_READER_URL: &str = "https://api.z.ai/api/mcp/web_reader/mcp";
pub const DEFAULT_CHAT_URL: &str = "https://api.z.ai/api/coding/paas/v4/chat/completions";
pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("{field} must not be empty")]
    EmptyUrl { field: &'static str },
}

/// Everything the gateway needs to talk to upstream.
#[derive(Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub search_url: String,
    pub reader_url: String,
    pub chat_url: String,
    pub port: u16,
    pub log_level: String,
    pub retry: RetryPolicy,
    pub error_log_capacity: usize,
}

impl GatewayConfig {
    /// Create a configuration with default upstream URLs.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            reader_url: DEFAULT_READER_URL.to_string(),
            chat_url: DEFAULT_CHAT_URL.to_string(),
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            retry: RetryPolicy::default(),
            error_log_capacity: DEFAULT_ERROR_LOG_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    #[must_use]
    pub fn with_reader_url(mut self, url: impl Into<String>) -> Self {
        self.reader_url = url.into();
        self
    }

    #[must_use]
    pub fn with_chat_url(mut self, url: impl Into<String>) -> Self {
        self.chat_url = url.into();
        self
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn with_error_log_capacity(mut self, capacity: usize) -> Self {
        self.error_log_capacity = capacity;
        self
    }

    /// Check that required values are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        for (field, value) in [
            ("search_url", &self.search_url),
            ("reader_url", &self.reader_url),
            ("chat_url", &self.chat_url),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyUrl { field });
            }
        }
        Ok(())
    }
}

/// Defaults with an empty API key; [`GatewayConfig::validate`] rejects it.
impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new("")
    }
}

// Hand-written so the API key never ends up in logs.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &"<redacted>")
            .field("search_url", &self.search_url)
            .field("reader_url", &self.reader_url)
            .field("chat_url", &self.chat_url)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("retry", &self.retry)
            .field("error_log_capacity", &self.error_log_capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::new("key");
        assert_eq!(config.search_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.reader_url, DEFAULT_READER_URL);
        assert_eq!(config.chat_url, DEFAULT_CHAT_URL);
        assert_eq!(config.port, 8081);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.error_log_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GatewayConfig::new("key")
            .with_search_url("http://localhost:1/search")
            .with_reader_url("http://localhost:1/reader")
            .with_chat_url("http://localhost:1/chat")
            .with_port(9000)
            .with_log_level("debug")
            .with_retry(RetryPolicy::new().with_base_delay(Duration::from_millis(10)))
            .with_error_log_capacity(5);

        assert_eq!(config.search_url, "http://localhost:1/search");
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.retry.base_delay(), Duration::from_millis(10));
        assert_eq!(config.error_log_capacity, 5);
    }

    #[test]
    fn test_validate_rejects_missing_key() {
        assert_eq!(
            GatewayConfig::new("  ").validate(),
            Err(ConfigError::MissingApiKey)
        );
    }

    #[test]
    fn test_default_needs_a_key() {
        let config = GatewayConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.validate(), Err(ConfigError::MissingApiKey));
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let config = GatewayConfig::new("key").with_reader_url("");
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyUrl {
                field: "reader_url"
            })
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", GatewayConfig::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}

//! Caller-facing error taxonomy.
//!
//! Tool invocations absorb every variant into a `ToolResult` with
//! `is_error` set; the chat-completion proxy maps variants onto HTTP status
//! codes through [`GatewayError::http_status`].

use thiserror::Error;

/// Errors surfaced by the translation layer.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bad or missing caller input. Never retried, never sent upstream.
    #[error("{0}")]
    Validation(String),

    /// Inbound body could not be decoded.
    #[error("invalid JSON: {0}")]
    Decode(String),

    /// Network failure or timeout after retries were exhausted.
    #[error("{context}: {message}")]
    Transport {
        /// What was being attempted, e.g. "web search upstream failed"
        context: String,
        /// Underlying transport error text
        message: String,
    },

    /// Upstream answered with a non-success status.
    #[error("upstream returned status {status}")]
    UpstreamStatus {
        /// HTTP status code from upstream
        status: u16,
        /// Truncated response body
        body: String,
    },

    /// Caller deadline fired or the request was aborted.
    #[error("request cancelled")]
    Cancelled,

    /// Failure inside the gateway itself (serialization, request construction).
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// Build a transport error with a context prefix.
    pub fn transport(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// HTTP status to answer with when this error reaches an HTTP caller.
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Decode(_) => 400,
            Self::Transport { .. } | Self::Cancelled => 502,
            Self::UpstreamStatus { status, .. } => *status,
            Self::Internal(_) => 500,
        }
    }

    /// Stable error type discriminant for OpenAI-style error bodies.
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Decode(_) => "invalid_request_error",
            Self::Transport { .. } | Self::Cancelled | Self::UpstreamStatus { .. } => {
                "upstream_error"
            }
            Self::Internal(_) => "server_error",
        }
    }
}

//! Final result of a resilient call.

use reqwest::StatusCode;

use crate::response::UpstreamResponse;
use crate::transport::TransportError;

/// What [`ResilientClient::execute`](crate::ResilientClient::execute) ended with.
#[derive(Debug)]
pub enum UpstreamOutcome {
    /// A non-retryable response (status < 500 and not 429), returned on first sight.
    Success(UpstreamResponse),
    /// The last attempt failed at the transport level, or the call was cancelled.
    TransientFailure { cause: TransportError },
    /// Every attempt produced a 5xx/429; this is the last of them.
    TerminalFailure(UpstreamResponse),
}

impl UpstreamOutcome {
    /// Collapse into the response whenever one was obtained.
    pub fn into_response(self) -> Result<UpstreamResponse, TransportError> {
        match self {
            Self::Success(response) | Self::TerminalFailure(response) => Ok(response),
            Self::TransientFailure { cause } => Err(cause),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Success(response) | Self::TerminalFailure(response) => Some(response.status()),
            Self::TransientFailure { .. } => None,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::TransientFailure {
                cause: TransportError::Cancelled
            }
        )
    }
}

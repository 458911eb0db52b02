//! Retrying upstream client.
//!
//! Every attempt gets a fresh header set derived from the [`OutboundCall`],
//! its own timeout, and is raced against the caller's cancellation token.
//! Transport errors and 5xx/429 responses are retried with exponential
//! backoff; any other response is returned immediately.

use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use zeke_core::RetryPolicy;

use crate::call::OutboundCall;
use crate::outcome::UpstreamOutcome;
use crate::response::UpstreamResponse;
use crate::transport::{HttpTransport, ReqwestTransport, TransportError};

/// What the most recent attempt produced. Only the last one is kept.
enum LastAttempt {
    Response(UpstreamResponse),
    Error(TransportError),
}

/// Upstream HTTP client with retry, backoff and cancellation.
///
/// Cheap to share behind an `Arc`; the underlying transport pools
/// connections across calls.
#[derive(Clone)]
pub struct ResilientClient {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientClient")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ResilientClient {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Client over a pooled reqwest transport.
    pub fn with_reqwest(policy: RetryPolicy) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?), policy))
    }

    /// Run `call` until it yields a non-retryable response, attempts run
    /// out, or `cancel` fires.
    ///
    /// Cancellation is observed both while a request is in flight and
    /// during backoff, and ends the call with
    /// `TransientFailure { cause: TransportError::Cancelled }`.
    pub async fn execute(&self, call: &OutboundCall, cancel: &CancellationToken) -> UpstreamOutcome {
        let max_attempts = self.policy.max_attempts();
        let timeout = self.policy.request_timeout();
        let mut last: Option<LastAttempt> = None;

        for attempt in 0..max_attempts {
            let request = call.prepare(timeout);

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return cancelled(),
                result = tokio::time::timeout(timeout, self.transport.send(request)) => {
                    result.unwrap_or(Err(TransportError::Timeout(timeout)))
                }
            };

            let slot = match result {
                Ok(response) if !response.is_retryable() => {
                    debug!(
                        url = %call.url(),
                        status = response.status().as_u16(),
                        attempt = attempt + 1,
                        "upstream responded"
                    );
                    return UpstreamOutcome::Success(response);
                }
                Ok(response) => LastAttempt::Response(response),
                Err(err) => LastAttempt::Error(err),
            };

            if self.policy.is_last_attempt(attempt) {
                last = Some(slot);
                break;
            }

            let delay = self.policy.delay(attempt);
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            match &slot {
                LastAttempt::Response(response) => warn!(
                    url = %call.url(),
                    status = response.status().as_u16(),
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms,
                    "retryable upstream status, backing off"
                ),
                LastAttempt::Error(err) => warn!(
                    url = %call.url(),
                    error = %err,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms,
                    "upstream request failed, backing off"
                ),
            }
            last = Some(slot);

            tokio::select! {
                biased;
                () = cancel.cancelled() => return cancelled(),
                () = tokio::time::sleep(delay) => {}
            }
        }

        match last {
            Some(LastAttempt::Response(response)) => {
                warn!(
                    url = %call.url(),
                    status = response.status().as_u16(),
                    max_attempts,
                    "upstream retries exhausted"
                );
                UpstreamOutcome::TerminalFailure(response)
            }
            Some(LastAttempt::Error(cause)) => {
                warn!(url = %call.url(), error = %cause, max_attempts, "upstream retries exhausted");
                UpstreamOutcome::TransientFailure { cause }
            }
            // max_attempts is clamped to at least one, so this is unreachable in practice
            None => UpstreamOutcome::TransientFailure {
                cause: TransportError::Request("no attempt was made".to_string()),
            },
        }
    }
}

const fn cancelled() -> UpstreamOutcome {
    UpstreamOutcome::TransientFailure {
        cause: TransportError::Cancelled,
    }
}

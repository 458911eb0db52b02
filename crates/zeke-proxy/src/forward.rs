//! Chat-completion passthrough to the GLM coding endpoint.
//!
//! The inbound body is decoded only far enough to normalize `model`; the
//! upstream response is streamed back with its status and headers.

use axum::body::Body;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{StreamExt, future};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use zeke_core::{ErrorRing, GatewayError, RingLogEntry};
use zeke_http::{OutboundCall, ResilientClient, TransportError, UpstreamOutcome, UpstreamResponse};

use crate::error::ProxyError;

/// Source name used for ring log entries.
pub const CHAT_COMPLETIONS_ROUTE: &str = "chat_completions";

/// GLM model names in their canonical spelling.
pub const KNOWN_GLM_MODELS: &[&str] = &[
    "glm-4.6",
    "glm-4.5",
    "glm-4.5-air",
    "glm-4.5-x",
    "glm-4.5-airx",
    "glm-4.5-flash",
];

/// Headers managed by the HTTP stack on each hop; never copied from upstream.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
    // The body is re-framed, so the upstream length may not hold
    "content-length",
];

fn should_forward_header(name: &str) -> bool {
    !HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Rewrite a known GLM model name to its canonical lowercase spelling.
///
/// Returns `true` when the value changed. Unknown names and non-string
/// values are left alone.
pub fn normalize_model(request: &mut Map<String, Value>) -> bool {
    let Some(Value::String(model)) = request.get_mut("model") else {
        return false;
    };
    let Some(canonical) = KNOWN_GLM_MODELS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(model.as_str()))
    else {
        return false;
    };
    if model.as_str() == *canonical {
        return false;
    }
    *model = (*canonical).to_string();
    true
}

/// Forwards chat-completion requests upstream with the configured API key.
pub struct ChatProxy {
    client: Arc<ResilientClient>,
    api_key: String,
    upstream_url: String,
    ring: Arc<ErrorRing>,
}

impl fmt::Debug for ChatProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatProxy")
            .field("upstream_url", &self.upstream_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ChatProxy {
    pub fn new(
        client: Arc<ResilientClient>,
        api_key: impl Into<String>,
        upstream_url: impl Into<String>,
        ring: Arc<ErrorRing>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            upstream_url: upstream_url.into(),
            ring,
        }
    }

    /// Forward `body` upstream and stream the answer back.
    ///
    /// Answers 400 without contacting upstream when `body` is not a JSON
    /// object, 500 when the outbound request cannot be built and 502 when
    /// upstream cannot be reached. Any upstream status is passed through.
    pub async fn forward(&self, body: &[u8], cancel: &CancellationToken) -> Response {
        match self.try_forward(body, cancel).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }

    async fn try_forward(
        &self,
        body: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Response, ProxyError> {
        let call = self.prepare(body)?;

        let response = match self.client.execute(&call, cancel).await {
            UpstreamOutcome::Success(response) => response,
            UpstreamOutcome::TerminalFailure(response) => {
                warn!(
                    endpoint = %self.upstream_url,
                    status = response.status().as_u16(),
                    "chat completion retries exhausted, passing status through"
                );
                self.ring.record(
                    RingLogEntry::new(
                        CHAT_COMPLETIONS_ROUTE,
                        &self.upstream_url,
                        format!("upstream returned status {}", response.status().as_u16()),
                    )
                    .with_status(response.status().as_u16()),
                );
                response
            }
            UpstreamOutcome::TransientFailure { cause } => {
                return Err(self.upstream_failure(cause).into());
            }
        };

        Ok(stream_response(response))
    }

    /// Decode, normalize and re-encode the inbound body into an upstream call.
    fn prepare(&self, body: &[u8]) -> Result<OutboundCall, GatewayError> {
        let mut request: Map<String, Value> = serde_json::from_slice(body).map_err(|e| {
            debug!(error = %e, "rejecting chat completion body");
            GatewayError::Decode(e.to_string())
        })?;

        let requested = request.get("model").and_then(Value::as_str).map(str::to_owned);
        if normalize_model(&mut request) {
            debug!(from = ?requested, "normalized model name");
        }
        // Bound outside the macro: tracing brings its own `Value` into scope
        let model = request.get("model").and_then(Value::as_str).unwrap_or_default();
        let streaming = request.get("stream").and_then(Value::as_bool).unwrap_or(false);
        info!(model, streaming, "forwarding chat completion");

        let payload = serde_json::to_vec(&request)
            .map_err(|_| GatewayError::Internal("failed to marshal request".to_string()))?;

        OutboundCall::build("POST", &self.upstream_url, Some(payload.into()))
            .and_then(|call| call.with_bearer_auth(&self.api_key))
            .map(OutboundCall::with_json_content_type)
            .map_err(|e| {
                error!(endpoint = %self.upstream_url, error = %e, "could not build upstream request");
                GatewayError::Internal("failed to create request".to_string())
            })
    }

    fn upstream_failure(&self, cause: TransportError) -> GatewayError {
        error!(endpoint = %self.upstream_url, error = %cause, "chat completion upstream failed");
        self.ring.record(RingLogEntry::new(
            CHAT_COMPLETIONS_ROUTE,
            &self.upstream_url,
            cause.to_string(),
        ));

        if cause.is_cancelled() {
            GatewayError::Cancelled
        } else {
            GatewayError::transport("upstream GLM error", cause)
        }
    }
}

/// Copy status and end-to-end headers, then stream the body as it arrives.
fn stream_response(response: UpstreamResponse) -> Response {
    let (status, upstream_headers, stream) = response.into_parts();

    // A broken upstream body ends the response; the status line is already sent
    let body = stream
        .take_while(|chunk| {
            if let Err(e) = chunk {
                debug!(error = %e, "upstream body ended early");
            }
            future::ready(chunk.is_ok())
        })
        .filter_map(|chunk| future::ready(chunk.ok()))
        .map(Ok::<_, Infallible>);

    let mut headers = HeaderMap::with_capacity(upstream_headers.len());
    for (name, value) in &upstream_headers {
        if should_forward_header(name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }

    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

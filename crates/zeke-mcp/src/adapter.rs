//! Tool invocation: one validated tool call becomes one upstream request.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use zeke_core::{ErrorRing, GatewayError, MAX_SNIPPET_CHARS, RingLogEntry, ToolResult, snippet};
use zeke_http::{OutboundCall, ResilientClient, StatusCode};

use crate::tools::ToolKind;

/// API key sent upstream as a bearer token.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Runs tool calls against upstream and converts every outcome into a
/// [`ToolResult`].
#[derive(Debug, Clone)]
pub struct ToolAdapter {
    client: Arc<ResilientClient>,
    ring: Arc<ErrorRing>,
}

impl ToolAdapter {
    pub const fn new(client: Arc<ResilientClient>, ring: Arc<ErrorRing>) -> Self {
        Self { client, ring }
    }

    /// Invoke `tool_name` with `arguments` against `endpoint`.
    ///
    /// Never fails: validation errors, upstream failures and unreadable
    /// bodies all come back as a result with `is_error` set. Validation runs
    /// before any network activity.
    pub async fn invoke(
        &self,
        tool_name: &str,
        arguments: &Value,
        credentials: &Credentials,
        endpoint: &str,
        cancel: &CancellationToken,
    ) -> ToolResult {
        let Some(kind) = ToolKind::from_name(tool_name) else {
            return ToolResult::error(format!("unknown tool: {tool_name}"));
        };

        match self.run(kind, arguments, credentials, endpoint, cancel).await {
            Ok(result) => result,
            Err(err) => ToolResult::error(err.to_string()),
        }
    }

    async fn run(
        &self,
        kind: ToolKind,
        arguments: &Value,
        credentials: &Credentials,
        endpoint: &str,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, GatewayError> {
        let payload = kind.upstream_payload(arguments)?;

        let call = OutboundCall::build("POST", endpoint, Some(payload.into()))
            .and_then(|call| call.with_bearer_auth(credentials.api_key()))
            .map(OutboundCall::with_json_content_type)
            .map_err(|e| {
                debug!(tool = kind.name(), endpoint, error = %e, "could not build upstream request");
                GatewayError::Internal("failed to create request".to_string())
            })?;

        let response = match self.client.execute(&call, cancel).await.into_response() {
            Ok(response) => response,
            Err(cause) => {
                self.report(kind, endpoint, None, &cause.to_string(), "");
                return Err(GatewayError::transport(kind.failure_context(), cause));
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let err = GatewayError::UpstreamStatus {
                status: status.as_u16(),
                body: snippet(&body, MAX_SNIPPET_CHARS),
            };
            self.report(kind, endpoint, Some(status), &err.to_string(), &body);
            return Err(err);
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                self.report(kind, endpoint, Some(status), &e.to_string(), "");
                return Err(GatewayError::Internal(
                    "failed to read response".to_string(),
                ));
            }
        };

        Ok(format_result(kind, &body))
    }

    fn report(
        &self,
        kind: ToolKind,
        endpoint: &str,
        status: Option<StatusCode>,
        message: &str,
        body: &str,
    ) {
        let status = status.map(|s| s.as_u16());
        error!(
            tool = kind.name(),
            endpoint,
            status,
            error = message,
            body = %snippet(body, MAX_SNIPPET_CHARS),
            "tool upstream call failed"
        );

        let mut entry = RingLogEntry::new(kind.name(), endpoint, message).with_body(body);
        if let Some(status) = status {
            entry = entry.with_status(status);
        }
        self.ring.record(entry);
    }
}

/// Pretty-print a JSON body under the tool's label, or pass anything else
/// through verbatim.
fn format_result(kind: ToolKind, body: &[u8]) -> ToolResult {
    let pretty = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok());

    let text = match pretty {
        Some(pretty) => format!("{} results:\n{pretty}", kind.label()),
        None => String::from_utf8_lossy(body).into_owned(),
    };

    let mut structured = Map::new();
    structured.insert(kind.output_key().to_string(), Value::String(text.clone()));
    ToolResult::success(text, Value::Object(structured))
}

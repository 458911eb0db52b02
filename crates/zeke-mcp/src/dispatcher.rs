//! Minimal MCP server: method routing over JSON-RPC 2.0.
//!
//! Transport-agnostic; the HTTP layer hands over the raw body and writes
//! back whatever [`McpDispatcher::handle_body`] returns. Tool faults never
//! become JSON-RPC errors, they travel inside the `tools/call` result.

use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::adapter::{Credentials, ToolAdapter};
use crate::jsonrpc::{JSONRPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::tools::ToolKind;

/// Protocol revision reported when the client does not ask for one.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

pub const SERVER_NAME: &str = "zeke-bridge";

/// Upstream URL for each tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEndpoints {
    pub search_url: String,
    pub reader_url: String,
}

impl ToolEndpoints {
    pub fn url_for(&self, kind: ToolKind) -> &str {
        match kind {
            ToolKind::Search => &self.search_url,
            ToolKind::Reader => &self.reader_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Routes MCP requests to the tool adapter.
#[derive(Debug, Clone)]
pub struct McpDispatcher {
    adapter: ToolAdapter,
    credentials: Credentials,
    endpoints: ToolEndpoints,
}

impl McpDispatcher {
    pub const fn new(
        adapter: ToolAdapter,
        credentials: Credentials,
        endpoints: ToolEndpoints,
    ) -> Self {
        Self {
            adapter,
            credentials,
            endpoints,
        }
    }

    /// Decode and handle a raw request body.
    ///
    /// Returns `None` for notifications, which get no response.
    pub async fn handle_body(
        &self,
        body: &[u8],
        cancel: &CancellationToken,
    ) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(e),
                ));
            }
        };

        // Echo the id back even when the envelope is malformed
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle(request, cancel).await,
            Err(e) => Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request(e),
            )),
        }
    }

    /// Handle one decoded request.
    pub async fn handle(
        &self,
        request: JsonRpcRequest,
        cancel: &CancellationToken,
    ) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "notification received");
            return None;
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request(format!(
                    "unsupported jsonrpc version '{}'",
                    request.jsonrpc
                )),
            ));
        }

        let result = match request.method.as_str() {
            "initialize" => Ok(initialize_result(request.params.as_ref())),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": ToolKind::ALL.map(ToolKind::descriptor) })),
            "tools/call" => self.call_tool(request.params, cancel).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    async fn call_tool(
        &self,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(JsonRpcError::invalid_params)?;

        let endpoint = ToolKind::from_name(&params.name)
            .map_or("", |kind| self.endpoints.url_for(kind));

        let result = self
            .adapter
            .invoke(
                &params.name,
                &params.arguments,
                &self.credentials,
                endpoint,
                cancel,
            )
            .await;
        info!(tool = %params.name, is_error = result.is_error(), "tool call finished");

        serde_json::to_value(&result).map_err(JsonRpcError::internal)
    }
}

fn initialize_result(params: Option<&Value>) -> Value {
    let protocol_version = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION);

    json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

//! Result of a tool invocation.
//!
//! Serialized in the MCP `CallToolResult` shape so it can be returned
//! directly from a `tools/call` request.

use serde::Serialize;
use serde_json::Value;

/// Outcome of a tool invocation. Tool callers always receive one of these,
/// never a raised fault.
///
/// An error result never carries a structured payload; the constructors
/// are the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "CallToolResult")]
pub struct ToolResult {
    is_error: bool,
    display_text: String,
    structured_payload: Option<Value>,
}

impl ToolResult {
    /// A successful result with a structured payload alongside the text.
    pub fn success(display_text: impl Into<String>, structured: Value) -> Self {
        Self {
            is_error: false,
            display_text: display_text.into(),
            structured_payload: Some(structured),
        }
    }

    /// An error result carrying a human-readable diagnostic.
    pub fn error(diagnostic: impl Into<String>) -> Self {
        Self {
            is_error: true,
            display_text: diagnostic.into(),
            structured_payload: None,
        }
    }

    pub const fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub const fn structured_payload(&self) -> Option<&Value> {
        self.structured_payload.as_ref()
    }
}

/// Wire shape of an MCP tool call result.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CallToolResult {
    content: Vec<TextContent>,
    is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    structured_content: Option<Value>,
}

#[derive(Serialize)]
struct TextContent {
    r#type: &'static str,
    text: String,
}

impl From<ToolResult> for CallToolResult {
    fn from(result: ToolResult) -> Self {
        Self {
            content: vec![TextContent {
                r#type: "text",
                text: result.display_text,
            }],
            is_error: result.is_error,
            structured_content: result.structured_payload,
        }
    }
}

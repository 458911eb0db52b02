//! Tool catalogue and argument types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use zeke_core::GatewayError;

/// The tools this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Search,
    Reader,
}

impl ToolKind {
    pub const ALL: [Self; 2] = [Self::Search, Self::Reader];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Search => "zai_search",
            Self::Reader => "zai_reader",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Search => "High-reliability web search via Z.AI devpack.",
            Self::Reader => "High-reliability web reader via Z.AI devpack.",
        }
    }

    /// JSON Schema of the tool's arguments, as advertised by `tools/list`.
    pub fn input_schema(self) -> Value {
        match self {
            Self::Search => json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" },
                    "lang": { "type": "string", "description": "Optional result language" }
                },
                "required": ["query"]
            }),
            Self::Reader => json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "URL of the page to read" }
                },
                "required": ["url"]
            }),
        }
    }

    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }

    /// Prefix of the success text, e.g. `Search results:`.
    pub(crate) const fn label(self) -> &'static str {
        match self {
            Self::Search => "Search",
            Self::Reader => "Reader",
        }
    }

    /// Context prefix for transport failures.
    pub(crate) const fn failure_context(self) -> &'static str {
        match self {
            Self::Search => "web search upstream failed",
            Self::Reader => "web reader upstream failed",
        }
    }

    /// Key of the structured payload on success.
    pub(crate) const fn output_key(self) -> &'static str {
        match self {
            Self::Search => "results",
            Self::Reader => "content",
        }
    }

    /// Validate `arguments` and produce the upstream request body.
    ///
    /// A missing or null `arguments` is treated as an empty object so that
    /// the required-field message is reported.
    pub(crate) fn upstream_payload(self, arguments: &Value) -> Result<Vec<u8>, GatewayError> {
        let arguments = match arguments {
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        };

        let body = match self {
            Self::Search => {
                let args: SearchArgs = parse_args(arguments)?;
                if args.query.is_empty() {
                    return Err(GatewayError::Validation("query is required".to_string()));
                }
                serde_json::to_vec(&SearchRequest {
                    query: &args.query,
                    lang: args.lang.as_deref().filter(|lang| !lang.is_empty()),
                })
            }
            Self::Reader => {
                let args: ReaderArgs = parse_args(arguments)?;
                if args.url.is_empty() {
                    return Err(GatewayError::Validation("url is required".to_string()));
                }
                serde_json::to_vec(&ReaderRequest { url: &args.url })
            }
        };

        body.map_err(|_| GatewayError::Internal("failed to marshal request".to_string()))
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, GatewayError> {
    serde_json::from_value(arguments)
        .map_err(|e| GatewayError::Validation(format!("invalid arguments: {e}")))
}

/// Arguments of `zai_search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchArgs {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub lang: Option<String>,
}

/// Arguments of `zai_reader`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReaderArgs {
    #[serde(default)]
    pub url: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lang: Option<&'a str>,
}

#[derive(Serialize)]
struct ReaderRequest<'a> {
    url: &'a str,
}

/// Entry of a `tools/list` result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(kind: ToolKind, arguments: Value) -> Result<Value, GatewayError> {
        kind.upstream_payload(&arguments)
            .map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(ToolKind::from_name("zai_search"), Some(ToolKind::Search));
        assert_eq!(ToolKind::from_name("zai_reader"), Some(ToolKind::Reader));
        assert_eq!(ToolKind::from_name("zai_writer"), None);
    }

    #[test]
    fn test_search_payload() {
        let body = payload(ToolKind::Search, json!({"query": "rust", "lang": "en"})).unwrap();
        assert_eq!(body, json!({"query": "rust", "lang": "en"}));

        // Empty lang is dropped
        let body = payload(ToolKind::Search, json!({"query": "rust", "lang": ""})).unwrap();
        assert_eq!(body, json!({"query": "rust"}));
    }

    #[test]
    fn test_reader_payload() {
        let body = payload(ToolKind::Reader, json!({"url": "https://example.com"})).unwrap();
        assert_eq!(body, json!({"url": "https://example.com"}));
    }

    #[test]
    fn test_missing_required_fields() {
        let err = payload(ToolKind::Search, json!({})).unwrap_err();
        assert_eq!(err.to_string(), "query is required");

        let err = payload(ToolKind::Search, Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "query is required");

        let err = payload(ToolKind::Reader, json!({"url": ""})).unwrap_err();
        assert_eq!(err.to_string(), "url is required");
    }

    #[test]
    fn test_wrong_argument_types() {
        let err = payload(ToolKind::Search, json!({"query": 5})).unwrap_err();
        assert!(err.to_string().starts_with("invalid arguments: "));

        let err = payload(ToolKind::Reader, json!("https://example.com")).unwrap_err();
        assert!(err.to_string().starts_with("invalid arguments: "));
    }

    #[test]
    fn test_descriptor_shape() {
        let descriptor = serde_json::to_value(ToolKind::Search.descriptor()).unwrap();
        assert_eq!(descriptor["name"], "zai_search");
        assert_eq!(descriptor["inputSchema"]["required"], json!(["query"]));
    }
}

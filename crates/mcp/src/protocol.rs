//! MCP wire types for the HTTP tool-server contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version assumed when a server does not report one.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Response of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerInfo {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_protocol() -> String {
    "MCP".to_string()
}

fn default_version() -> String {
    PROTOCOL_VERSION.to_string()
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            version: default_version(),
        }
    }
}

/// Tool definition returned by `GET /tools`.
///
/// The schema is kept as raw JSON; servers publish it in several shapes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub schema: Value,
}

/// Body of `GET /tools`, either wrapped or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListToolsResponse {
    Wrapped { tools: Vec<ToolDescriptor> },
    Bare(Vec<ToolDescriptor>),
}

impl ListToolsResponse {
    pub fn into_tools(self) -> Vec<ToolDescriptor> {
        match self {
            Self::Wrapped { tools } | Self::Bare(tools) => tools,
        }
    }
}

/// Body of `POST /execute`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteRequest<'a> {
    pub name: &'a str,
    pub parameters: &'a Value,
}

/// Content block inside an error body.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ToolContent {
    /// Get text content if this is a text content block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolContent::Text { text } => Some(text),
            ToolContent::Other => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    is_error: bool,
    #[serde(default)]
    content: Vec<ToolContent>,
}

/// Interpreted result of a 2xx `POST /execute`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    Success(Value),
    Failure(String),
}

impl ExecuteOutcome {
    /// Interpret a successful response body.
    ///
    /// A non-null `result` field wins; otherwise the raw body is the result.
    /// A body flagged `isError` is a failure carrying its joined text blocks.
    pub fn from_body(body: Value) -> Self {
        if let Ok(error) = serde_json::from_value::<ErrorBody>(body.clone()) {
            if error.is_error {
                let text = error
                    .content
                    .iter()
                    .filter_map(ToolContent::as_text)
                    .collect::<Vec<_>>()
                    .join("\n");
                return Self::Failure(text);
            }
        }

        match body {
            Value::Object(mut map) => match map.remove("result") {
                Some(result) if !result.is_null() => Self::Success(result),
                Some(_) | None => Self::Success(Value::Object(map)),
            },
            other => Self::Success(other),
        }
    }
}

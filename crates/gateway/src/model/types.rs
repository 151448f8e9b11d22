use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message content: plain text or an arbitrary structured payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Structured(Value),
}

impl Content {
    /// Text rendering; structured content is serialized as JSON.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Structured(Value::String(text)) => Cow::Borrowed(text),
            Self::Structured(Value::Null) => Cow::Borrowed(""),
            Self::Structured(value) => Cow::Owned(value.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_text().trim().is_empty()
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A tool call requested by the model.
///
/// `tool_name` is exactly what the provider returned and may be a
/// sanitized form of the canonical catalog name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub tool_name: String,
    pub arguments: Value,
}

/// Outcome of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutcome {
    Success { value: Value },
    Error { message: String },
}

impl ToolOutcome {
    pub fn success(value: Value) -> Self {
        Self::Success { value }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The JSON value handed back to the model.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Success { value } => value.clone(),
            Self::Error { message } => json!({ "error": message }),
        }
    }

    /// Text content for a tool-result message.
    pub fn to_content(&self) -> String {
        match self.to_value() {
            Value::String(text) => text,
            other => other.to_string(),
        }
    }
}

/// The result of one tool call, correlated to its request by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub id: String,
    /// Canonical catalog name.
    pub tool_name: String,
    pub outcome: ToolOutcome,
}

impl ToolCallResult {
    pub fn is_ok(&self) -> bool {
        !self.outcome.is_error()
    }
}

/// A conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: Content,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    fn new(role: Role, content: impl Into<Content>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
            is_error: false,
        }
    }

    pub fn system(content: impl Into<Content>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<Content>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_tool_calls(mut self, calls: Vec<ToolCallRequest>) -> Self {
        self.tool_calls = calls;
        self
    }

    /// Tool-result message answering `request`.
    ///
    /// Keeps the provider-facing tool name so the replayed history matches
    /// what the model emitted.
    pub fn tool_result(request: &ToolCallRequest, result: &ToolCallResult) -> Self {
        Self {
            role: Role::Tool,
            content: Content::Text(result.outcome.to_content()),
            tool_calls: Vec::new(),
            tool_call_id: Some(request.id.clone()),
            tool_name: Some(request.tool_name.clone()),
            is_error: result.outcome.is_error(),
        }
    }

    /// Combined text content.
    pub fn text(&self) -> Cow<'_, str> {
        self.content.as_text()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl std::ops::AddAssign for Usage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_content_renders_as_json() {
        let content = Content::Structured(json!({"a": 1}));
        assert_eq!(content.as_text(), r#"{"a":1}"#);
        assert!(Content::Structured(Value::Null).is_empty());
    }

    #[test]
    fn message_deserializes_caller_shape() {
        let msg: Message = serde_json::from_value(json!({
            "role": "user",
            "content": "What's the weather in Paris?"
        }))
        .unwrap();
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "What's the weather in Paris?");
        assert!(!msg.has_tool_calls());
    }

    #[test]
    fn tool_result_message_carries_error_flag() {
        let request = ToolCallRequest {
            id: "call_1".into(),
            tool_name: "get_weather".into(),
            arguments: json!({}),
        };
        let result = ToolCallResult {
            id: "call_1".into(),
            tool_name: "get.weather".into(),
            outcome: ToolOutcome::error("HTTP 500"),
        };
        let msg = Message::tool_result(&request, &result);
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.tool_name.as_deref(), Some("get_weather"));
        assert!(msg.is_error);
        assert_eq!(msg.text(), r#"{"error":"HTTP 500"}"#);
    }
}

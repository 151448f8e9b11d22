//! Anthropic Messages API adapter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Completion, CompletionRequest, Provider, ProviderConfig, read_response};
use crate::model::{Content, Message, ProviderError, Role, ToolCallRequest, Usage};
use crate::schema::Dialect;

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: ApiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Blocks(Vec<ApiContentBlock>),
    /// Caller-supplied content blocks, passed through untouched.
    Raw(Value),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiResponseBlock>,
    #[serde(default)]
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default = "empty_input")]
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

fn empty_input() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Default, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model().to_string(),
            url: config
                .base_url
                .clone()
                .unwrap_or_else(|| ANTHROPIC_API_URL.to_string()),
            max_tokens: 4096,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn content_to_api(content: &Content) -> ApiContent {
        match content {
            Content::Structured(value @ Value::Array(_)) => ApiContent::Raw(value.clone()),
            other => ApiContent::Text(other.as_text().into_owned()),
        }
    }

    fn assistant_to_api(msg: &Message) -> ApiMessage {
        if !msg.has_tool_calls() {
            return ApiMessage {
                role: "assistant",
                content: Self::content_to_api(&msg.content),
            };
        }

        let text = msg.text();
        let mut blocks = Vec::with_capacity(msg.tool_calls.len() + 1);
        if !text.trim().is_empty() {
            blocks.push(ApiContentBlock::Text {
                text: text.into_owned(),
            });
        }
        blocks.extend(msg.tool_calls.iter().map(|call| ApiContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.tool_name.clone(),
            input: call.arguments.clone(),
        }));

        ApiMessage {
            role: "assistant",
            content: ApiContent::Blocks(blocks),
        }
    }

    fn tool_result_block(msg: &Message) -> ApiContentBlock {
        ApiContentBlock::ToolResult {
            tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
            content: msg.text().into_owned(),
            is_error: msg.is_error,
        }
    }

    /// Convert history to Anthropic messages.
    ///
    /// System messages are lifted out separately. Consecutive tool messages
    /// collapse into a single user message of `tool_result` blocks.
    fn messages_to_api(messages: &[Message]) -> Vec<ApiMessage> {
        let mut out: Vec<ApiMessage> = Vec::with_capacity(messages.len());
        let mut after_tool = false;

        for msg in messages {
            match msg.role {
                Role::System => continue,
                Role::User => out.push(ApiMessage {
                    role: "user",
                    content: Self::content_to_api(&msg.content),
                }),
                Role::Assistant => out.push(Self::assistant_to_api(msg)),
                Role::Tool => {
                    let block = Self::tool_result_block(msg);
                    match out.last_mut() {
                        Some(ApiMessage {
                            content: ApiContent::Blocks(blocks),
                            ..
                        }) if after_tool => blocks.push(block),
                        _ => out.push(ApiMessage {
                            role: "user",
                            content: ApiContent::Blocks(vec![block]),
                        }),
                    }
                }
            }
            after_tool = msg.role == Role::Tool;
        }

        out
    }

    fn system_prompt(request: &CompletionRequest<'_>) -> Option<String> {
        let supplied: Vec<_> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.text().into_owned())
            .collect();

        if supplied.is_empty() {
            request.injected_system().map(str::to_string)
        } else {
            Some(supplied.join("\n\n"))
        }
    }

    fn response_to_message(blocks: Vec<ApiResponseBlock>) -> Message {
        let mut text = Vec::new();
        let mut calls = Vec::new();

        for block in blocks {
            match block {
                ApiResponseBlock::Text { text: t } => text.push(t),
                ApiResponseBlock::ToolUse { id, name, input } => calls.push(ToolCallRequest {
                    id,
                    tool_name: name,
                    // A parameterless tool may come back without input or with null.
                    arguments: if input.is_null() { empty_input() } else { input },
                }),
                ApiResponseBlock::Unknown => {}
            }
        }

        Message::assistant(text.join("\n")).with_tool_calls(calls)
    }

    fn build_request(&self, request: &CompletionRequest<'_>) -> ApiRequest {
        // The final round still advertises tools: the API rejects a history
        // containing tool_use blocks when no tools are declared.
        let tools = request
            .tools
            .iter()
            .map(|t| t.to_provider_schema(Dialect::Anthropic))
            .collect();

        ApiRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: Self::messages_to_api(request.messages),
            system: Self::system_prompt(request),
            tools,
        }
    }
}

impl std::fmt::Display for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anthropic({})", self.model)
    }
}

impl Provider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, ProviderError> {
        let api_request = self.build_request(&request);

        tracing::debug!(
            model = %self.model,
            round = ?request.round,
            messages = api_request.messages.len(),
            tools = api_request.tools.len(),
            "anthropic request"
        );

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(&api_request)
            .send()
            .await;

        let api_response: ApiResponse = read_response(response).await?;

        Ok(Completion {
            message: Self::response_to_message(api_response.content),
            usage: Usage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ToolCallResult, ToolOutcome};
    use crate::providers::{DEFAULT_SYSTEM_PROMPT, Round};
    use serde_json::json;

    fn call(id: &str, name: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: id.into(),
            tool_name: name.into(),
            arguments: json!({"city": "Paris"}),
        }
    }

    fn result(id: &str, outcome: ToolOutcome) -> ToolCallResult {
        ToolCallResult {
            id: id.into(),
            tool_name: "weather".into(),
            outcome,
        }
    }

    #[test]
    fn tool_results_grouped_into_one_user_message() {
        let (a, b) = (call("toolu_1", "weather"), call("toolu_2", "weather"));
        let history = vec![
            Message::user("weather?"),
            Message::assistant("").with_tool_calls(vec![a.clone(), b.clone()]),
            Message::tool_result(&a, &result("toolu_1", ToolOutcome::success(json!({"t": 1})))),
            Message::tool_result(&b, &result("toolu_2", ToolOutcome::error("boom"))),
        ];

        let api = serde_json::to_value(AnthropicProvider::messages_to_api(&history)).unwrap();
        assert_eq!(api.as_array().unwrap().len(), 3);
        assert_eq!(
            api[1]["content"],
            json!([
                {"type": "tool_use", "id": "toolu_1", "name": "weather", "input": {"city": "Paris"}},
                {"type": "tool_use", "id": "toolu_2", "name": "weather", "input": {"city": "Paris"}}
            ])
        );
        assert_eq!(api[2]["role"], "user");
        assert_eq!(
            api[2]["content"],
            json!([
                {"type": "tool_result", "tool_use_id": "toolu_1", "content": "{\"t\":1}"},
                {"type": "tool_result", "tool_use_id": "toolu_2", "content": "{\"error\":\"boom\"}", "is_error": true}
            ])
        );
    }

    #[test]
    fn system_messages_lifted_out() {
        let history = [Message::system("be brief"), Message::user("hi")];
        let request = CompletionRequest {
            messages: &history,
            tools: &[],
            round: Round::Initial,
            system: None,
        };
        assert_eq!(AnthropicProvider::system_prompt(&request).as_deref(), Some("be brief"));
        assert_eq!(AnthropicProvider::messages_to_api(&history).len(), 1);

        let history = [Message::user("hi")];
        let request = CompletionRequest {
            messages: &history,
            ..request
        };
        assert_eq!(
            AnthropicProvider::system_prompt(&request).as_deref(),
            Some(DEFAULT_SYSTEM_PROMPT)
        );
    }

    #[test]
    fn response_blocks_map_to_message() {
        let response: ApiResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Let me check."},
                {"type": "thinking", "thinking": "..."},
                {"type": "tool_use", "id": "toolu_1", "name": "weather", "input": {"city": "Paris"}}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .unwrap();

        let message = AnthropicProvider::response_to_message(response.content);
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text(), "Let me check.");
        assert_eq!(message.tool_calls, vec![call("toolu_1", "weather")]);
        assert_eq!(response.usage.output_tokens, 5);
    }

    #[test]
    fn tool_use_without_input_gets_empty_arguments() {
        let response: ApiResponse = serde_json::from_value(json!({
            "content": [
                {"type": "tool_use", "id": "toolu_1", "name": "get_time"},
                {"type": "tool_use", "id": "toolu_2", "name": "get_time", "input": null}
            ],
            "usage": {"input_tokens": 3, "output_tokens": 2}
        }))
        .unwrap();

        let message = AnthropicProvider::response_to_message(response.content);
        assert_eq!(message.tool_calls.len(), 2);
        assert!(message.tool_calls.iter().all(|c| c.arguments == json!({})));
    }

    #[test]
    fn structured_user_content_passes_through() {
        let blocks = json!([{"type": "text", "text": "hi"}]);
        let history = [Message::user(Content::Structured(blocks.clone()))];
        let api = serde_json::to_value(AnthropicProvider::messages_to_api(&history)).unwrap();
        assert_eq!(api[0]["content"], blocks);
    }
}

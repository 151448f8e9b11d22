//! OpenAI Chat Completions adapter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Completion, CompletionRequest, Provider, ProviderConfig, Round, read_response};
use crate::model::{Content, Message, ProviderError, Role, ToolCallRequest, Usage};
use crate::schema::Dialect;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// OpenAI Chat Completions provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model().to_string(),
            url: config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_API_URL.to_string()),
        }
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    fn content_to_api(content: &Content) -> Value {
        match content {
            Content::Structured(value @ Value::Array(_)) => value.clone(),
            other => Value::String(other.as_text().into_owned()),
        }
    }

    fn message_to_api(msg: &Message) -> ApiMessage {
        let tool_calls: Vec<ApiToolCall> = msg
            .tool_calls
            .iter()
            .map(|call| ApiToolCall {
                id: call.id.clone(),
                call_type: function_type(),
                function: ApiFunctionCall {
                    name: call.tool_name.clone(),
                    arguments: match &call.arguments {
                        Value::String(raw) => raw.clone(),
                        other => other.to_string(),
                    },
                },
            })
            .collect();

        // An assistant turn that only calls tools carries no content.
        let content = if !tool_calls.is_empty() && msg.content.is_empty() {
            None
        } else {
            Some(Self::content_to_api(&msg.content))
        };

        ApiMessage {
            role: Self::role_to_api(msg.role),
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
            name: msg.tool_name.clone().filter(|_| msg.role == Role::Tool),
        }
    }

    /// Parse a function-call argument string.
    ///
    /// Malformed JSON is kept as a raw string so the executor reports it as
    /// a failure of that one call.
    fn parse_arguments(raw: &str) -> Value {
        if raw.trim().is_empty() {
            return Value::Object(Default::default());
        }
        serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "malformed tool call arguments");
            Value::String(raw.to_string())
        })
    }

    fn response_to_message(message: ApiResponseMessage) -> Message {
        let calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter(|call| call.call_type == "function")
            .map(|call| ToolCallRequest {
                arguments: Self::parse_arguments(&call.function.arguments),
                id: call.id,
                tool_name: call.function.name,
            })
            .collect();

        Message::assistant(message.content.unwrap_or_default()).with_tool_calls(calls)
    }

    fn build_request(&self, request: &CompletionRequest<'_>) -> ApiRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.injected_system() {
            messages.push(Self::message_to_api(&Message::system(system)));
        }
        messages.extend(request.messages.iter().map(Self::message_to_api));

        let (tools, tool_choice) = match request.round {
            Round::Initial if !request.tools.is_empty() => (
                request
                    .tools
                    .iter()
                    .map(|t| t.to_provider_schema(Dialect::OpenAi))
                    .collect(),
                Some("auto"),
            ),
            _ => (Vec::new(), None),
        };

        ApiRequest {
            model: self.model.clone(),
            messages,
            tools,
            tool_choice,
        }
    }
}

impl std::fmt::Display for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai({})", self.model)
    }
}

impl Provider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, ProviderError> {
        let api_request = self.build_request(&request);

        tracing::debug!(
            model = %self.model,
            round = ?request.round,
            messages = api_request.messages.len(),
            tools = api_request.tools.len(),
            "openai request"
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await;

        let api_response: ApiResponse = read_response(response).await?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("response has no choices".into()))?;

        let usage = api_response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(Completion {
            message: Self::response_to_message(choice.message),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ToolSource, calculator_tool};
    use crate::model::{ToolCallResult, ToolOutcome};
    use crate::providers::ProviderKind;
    use crate::schema::tool_definitions;
    use serde_json::json;

    fn provider() -> OpenAiProvider {
        let config = ProviderConfig::new(ProviderKind::OpenAi, "sk-test");
        OpenAiProvider::new(reqwest::Client::new(), &config)
    }

    #[test]
    fn initial_round_offers_tools_final_round_omits_them() {
        let catalog = Catalog::build(vec![ToolSource::declared(vec![calculator_tool()])], &[]);
        let tools = tool_definitions(&catalog);
        let history = [Message::user("2+2?")];
        let request = CompletionRequest {
            messages: &history,
            tools: &tools,
            round: Round::Initial,
            system: None,
        };

        let body = serde_json::to_value(provider().build_request(&request)).unwrap();
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "2+2?");

        let request = CompletionRequest {
            round: Round::Final,
            ..request
        };
        let body = serde_json::to_value(provider().build_request(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn replayed_tool_call_round_trips_to_wire() {
        let call = ToolCallRequest {
            id: "call_1".into(),
            tool_name: "get_weather".into(),
            arguments: json!({"city": "Paris"}),
        };
        let result = ToolCallResult {
            id: "call_1".into(),
            tool_name: "get.weather".into(),
            outcome: ToolOutcome::success(json!({"temperature": 18})),
        };

        let assistant = OpenAiProvider::message_to_api(
            &Message::assistant("").with_tool_calls(vec![call.clone()]),
        );
        let assistant = serde_json::to_value(assistant).unwrap();
        assert!(assistant.get("content").is_none());
        assert_eq!(
            assistant["tool_calls"][0],
            json!({
                "id": "call_1",
                "type": "function",
                "function": {"name": "get_weather", "arguments": "{\"city\":\"Paris\"}"}
            })
        );

        let tool = serde_json::to_value(OpenAiProvider::message_to_api(&Message::tool_result(
            &call, &result,
        )))
        .unwrap();
        assert_eq!(
            tool,
            json!({
                "role": "tool",
                "content": "{\"temperature\":18}",
                "tool_call_id": "call_1",
                "name": "get_weather"
            })
        );
    }

    #[test]
    fn response_parses_tool_calls_and_arguments() {
        let response: ApiResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "a", "type": "function", "function": {"name": "calc", "arguments": "{\"expression\":\"1+1\"}"}},
                        {"id": "b", "type": "function", "function": {"name": "calc", "arguments": "{not json"}},
                        {"id": "c", "type": "function", "function": {"name": "calc", "arguments": ""}}
                    ]
                }
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        }))
        .unwrap();

        let choice = response.choices.into_iter().next().unwrap();
        let message = OpenAiProvider::response_to_message(choice.message);
        assert_eq!(message.text(), "");
        assert_eq!(message.tool_calls.len(), 3);
        assert_eq!(message.tool_calls[0].arguments, json!({"expression": "1+1"}));
        assert_eq!(message.tool_calls[1].arguments, json!("{not json"));
        assert_eq!(message.tool_calls[2].arguments, json!({}));
    }
}

//! LLM provider adapters.
//!
//! Each adapter implements one round of "complete with tools" against a
//! vendor wire format. Adding a vendor means adding an adapter and an
//! [`Adapter`] variant.

mod anthropic;
mod openai;

use std::future::Future;

use serde::Deserialize;

pub use anthropic::{ANTHROPIC_API_URL, AnthropicProvider};
pub use openai::{OPENAI_API_URL, OpenAiProvider};

use crate::model::{Message, ProviderError, Role, ToolCallRequest, Usage};
use crate::schema::ToolDefinition;
use crate::{Error, Result};

/// Injected when the caller supplies no system message.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant with access to external tools \
through the Model Context Protocol (MCP).

When asked about available tools or capabilities, use the list_available_tools tool to provide \
accurate information about what tools are available.

NEVER invent tools or capabilities you don't have. ALWAYS use the list_available_tools tool to \
check what's available when asked about your capabilities.

ALWAYS USE TOOLS when they can help answer a user's question, and always prefer real tool results \
over invented answers. Present information from tools in a clear, readable format.

If a tool call fails, explain what went wrong to the user.";

/// Which exchange of the turn a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    /// Tools offered, model decides whether to call them.
    Initial,
    /// Tool results included, model produces the final answer.
    Final,
}

/// Everything needed for one provider round.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
    pub round: Round,
    /// Replaces [`DEFAULT_SYSTEM_PROMPT`] when injection is needed.
    pub system: Option<&'a str>,
}

impl<'a> CompletionRequest<'a> {
    /// The system prompt to inject, or `None` if the caller supplied one.
    pub fn injected_system(&self) -> Option<&'a str> {
        if self.messages.iter().any(|m| m.role == Role::System) {
            None
        } else {
            Some(self.system.unwrap_or(DEFAULT_SYSTEM_PROMPT))
        }
    }
}

/// The assistant's reply to one round.
#[derive(Debug, Clone)]
pub struct Completion {
    pub message: Message,
    pub usage: Usage,
}

impl Completion {
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        &self.message.tool_calls
    }
}

/// Trait for LLM provider adapters.
pub trait Provider: Send + Sync {
    fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> impl Future<Output = std::result::Result<Completion, ProviderError>> + Send;
}

/// Vendor wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Anthropic => "claude-3-5-sonnet-20241022",
        }
    }

    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// The provider active for one turn.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Overrides the vendor endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            model: None,
            base_url: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn model(&self) -> &str {
        match self.model.as_deref() {
            Some(model) if !model.trim().is_empty() => model,
            _ => self.kind.default_model(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration(format!(
                "no API key provided for {}",
                self.kind
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("model", &self.model())
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// One of the concrete adapters, chosen from a [`ProviderConfig`].
pub enum Adapter {
    OpenAi(OpenAiProvider),
    Anthropic(AnthropicProvider),
}

impl Adapter {
    pub fn from_config(config: &ProviderConfig, http: reqwest::Client, max_tokens: u32) -> Result<Self> {
        config.validate()?;
        Ok(match config.kind {
            ProviderKind::OpenAi => Self::OpenAi(OpenAiProvider::new(http, config)),
            ProviderKind::Anthropic => {
                Self::Anthropic(AnthropicProvider::new(http, config).max_tokens(max_tokens))
            }
        })
    }
}

impl std::fmt::Display for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi(provider) => provider.fmt(f),
            Self::Anthropic(provider) => provider.fmt(f),
        }
    }
}

impl Provider for Adapter {
    async fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> std::result::Result<Completion, ProviderError> {
        match self {
            Self::OpenAi(provider) => provider.complete(request).await,
            Self::Anthropic(provider) => provider.complete(request).await,
        }
    }
}

/// Read a provider response, mapping transport and status failures.
async fn read_response<T: serde::de::DeserializeOwned>(
    response: std::result::Result<reqwest::Response, reqwest::Error>,
) -> std::result::Result<T, ProviderError> {
    let response = response.map_err(|e| ProviderError::Network(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api { status, body });
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_system_only_without_caller_system() {
        let with_system = [Message::system("be brief"), Message::user("hi")];
        let request = CompletionRequest {
            messages: &with_system,
            tools: &[],
            round: Round::Initial,
            system: None,
        };
        assert_eq!(request.injected_system(), None);

        let without = [Message::user("hi")];
        let request = CompletionRequest {
            messages: &without,
            ..request
        };
        assert_eq!(request.injected_system(), Some(DEFAULT_SYSTEM_PROMPT));

        let request = CompletionRequest {
            system: Some("custom"),
            ..request
        };
        assert_eq!(request.injected_system(), Some("custom"));
    }

    #[test]
    fn missing_api_key_is_configuration_error() {
        let config = ProviderConfig::new(ProviderKind::Anthropic, "  ");
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
        assert!(Adapter::from_config(&config, reqwest::Client::new(), 1024).is_err());
    }

    #[test]
    fn model_defaults_per_kind() {
        assert_eq!(ProviderConfig::new(ProviderKind::OpenAi, "k").model(), "gpt-4o");
        let config = ProviderConfig::new(ProviderKind::Anthropic, "k").with_model("claude-x");
        assert_eq!(config.model(), "claude-x");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ProviderConfig::new(ProviderKind::OpenAi, "sk-secret");
        assert!(!format!("{config:?}").contains("sk-secret"));
    }

    #[test]
    fn provider_kind_parses_lowercase() {
        let kind: ProviderKind = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(kind, ProviderKind::OpenAi);
    }
}

//! Configuration loading from toolgate.toml.

use std::path::Path;

use gateway::{GatewaySettings, ProviderConfig, ProviderKind};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Completion provider.
    #[serde(default)]
    pub provider: ProviderSection,

    /// Tool backend.
    #[serde(default)]
    pub server: ServerSection,

    /// Gateway tunables.
    #[serde(default)]
    pub gateway: GatewaySettings,
}

/// `[provider]` table.
#[derive(Debug, Deserialize)]
pub struct ProviderSection {
    #[serde(default = "default_kind")]
    pub kind: ProviderKind,

    /// Defaults per provider when unset.
    pub model: Option<String>,

    /// Falls back to `OPENAI_API_KEY` or `ANTHROPIC_API_KEY`.
    pub api_key: Option<String>,

    /// Overrides the vendor endpoint.
    pub base_url: Option<String>,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            model: None,
            api_key: None,
            base_url: None,
        }
    }
}

fn default_kind() -> ProviderKind {
    ProviderKind::Anthropic
}

/// `[server]` table.
#[derive(Debug, Default, Deserialize)]
pub struct ServerSection {
    pub url: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load `path` if it exists, else the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build the provider configuration.
    ///
    /// A key in the file wins over the provider's environment variable.
    pub fn provider_config(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ProviderConfig, ConfigError> {
        let section = &self.provider;
        let var = section.kind.api_key_env();

        let api_key = section
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| env(var).filter(|key| !key.trim().is_empty()))
            .ok_or(ConfigError::MissingApiKey {
                provider: section.kind,
                var,
            })?;

        let mut config = ProviderConfig::new(section.kind, api_key);
        config.model = section.model.clone();
        config.base_url = section.base_url.clone();
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("no API key for {provider}: set provider.api_key or {var}")]
    MissingApiKey {
        provider: ProviderKind,
        var: &'static str,
    },
}

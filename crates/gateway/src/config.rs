//! Gateway settings.

use std::time::Duration;

use serde::Deserialize;

use crate::catalog::HandlerId;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Tunables shared by the executor and orchestrator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// `max_tokens` sent to providers that require it.
    pub max_tokens: u32,
    /// Upper bound on concurrently running tool calls per round.
    pub concurrency: usize,
    /// Timeout for in-process handlers, in milliseconds.
    pub local_timeout_ms: u64,
    /// Timeout for remote `/execute` and discovery calls, in milliseconds.
    pub request_timeout_ms: u64,
    /// Return marked fallback data when a weather lookup fails.
    pub weather_fallback: bool,
    /// Replaces the default system prompt injected when none is supplied.
    pub system_prompt: Option<String>,
    /// Tool names dropped when building the catalog.
    pub exclude: Vec<String>,
    /// Local handlers offered alongside discovered tools.
    pub builtins: Vec<HandlerId>,
    pub geocoding_url: String,
    pub forecast_url: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            concurrency: 8,
            local_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            weather_fallback: false,
            system_prompt: None,
            exclude: Vec::new(),
            builtins: Vec::new(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
        }
    }
}

impl GatewaySettings {
    pub fn local_timeout(&self) -> Duration {
        Duration::from_millis(self.local_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Fan-out bound, never zero.
    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

//! HTTP client for a single MCP tool server.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{
    ExecuteOutcome, ExecuteRequest, ListToolsResponse, ServerInfo, ToolDescriptor,
};

/// Default timeout for MCP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Normalized base URL of an MCP server.
///
/// Always absolute, `http` or `https`, and ending in `/` so endpoints join
/// beneath it rather than replacing the last path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrl(Url);

impl ServerUrl {
    /// Normalize a user-supplied server address.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidUrl("empty server URL".into()));
        }

        let has_scheme = trimmed
            .split_once("://")
            .is_some_and(|(scheme, _)| !scheme.is_empty() && !scheme.contains('/'));
        let with_scheme = if has_scheme {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        let mut url = Url::parse(&with_scheme)
            .map_err(|e| Error::InvalidUrl(format!("{with_scheme}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "{with_scheme}: unsupported scheme {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::InvalidUrl(format!("{with_scheme}: missing host")));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self(url))
    }

    /// Resolve an endpoint relative to the base.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.0
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::InvalidUrl(format!("{}{path}: {e}", self.0)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Client bound to one MCP server.
///
/// Cheap to construct; the underlying `reqwest::Client` is shared.
#[derive(Debug, Clone)]
pub struct McpClient {
    http: reqwest::Client,
    server: ServerUrl,
    timeout: Duration,
}

impl McpClient {
    pub fn new(http: reqwest::Client, server: ServerUrl) -> Self {
        Self {
            http,
            server,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch protocol information, falling back to local defaults.
    pub async fn info(&self) -> ServerInfo {
        match self.get_json::<ServerInfo>("").await {
            Ok(info) => info,
            Err(e) => {
                warn!(server = %self.server, error = %e, "server info unavailable, using defaults");
                ServerInfo::default()
            }
        }
    }

    /// List the tools the server can execute.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let tools = self.get_json::<ListToolsResponse>("tools").await?.into_tools();
        debug!(server = %self.server, count = tools.len(), "listed tools");
        Ok(tools)
    }

    /// Execute a tool by its canonical name.
    ///
    /// Transport failures and non-2xx statuses are returned as errors; a 2xx
    /// body is interpreted by [`ExecuteOutcome::from_body`].
    pub async fn execute(&self, name: &str, parameters: Value) -> Result<ExecuteOutcome> {
        let url = self.server.endpoint("execute")?;
        let endpoint = url.to_string();
        debug!(tool = name, %endpoint, "executing remote tool");

        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(&ExecuteRequest {
                name,
                parameters: &parameters,
            })
            .send()
            .await
            .map_err(|e| Error::Transport {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        let body = Self::read_body(endpoint, response).await?;
        Ok(ExecuteOutcome::from_body(body))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.server.endpoint(path)?;
        let endpoint = url.to_string();

        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::Transport {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        let body = Self::read_body(endpoint, response).await?;
        serde_json::from_value(body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    async fn read_body(endpoint: String, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await.map_err(|e| Error::Transport {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(Error::Status {
                endpoint,
                status: status.as_u16(),
                body: text,
            });
        }

        // Some servers answer with plain text; keep it as a string result.
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

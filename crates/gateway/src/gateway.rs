//! One-call entry point: discover tools, build the catalog, run the turn.

use std::sync::Arc;

use mcp::{McpClient, ServerInfo, ServerUrl, ToolDescriptor};
use tracing::{info, instrument, warn};

use crate::catalog::{Catalog, SourceKind, Tool, ToolSource, builtin_tools};
use crate::config::GatewaySettings;
use crate::executor::ToolExecutor;
use crate::model::Message;
use crate::orchestrator::{Orchestrator, TurnOutcome};
use crate::providers::{Adapter, ProviderConfig};
use crate::schema::to_generic_schema;
use crate::{Error, Result};

/// Everything a caller supplies for one turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub messages: Vec<Message>,
    /// Base URL of the tool backend.
    pub server_url: Option<String>,
    pub provider: ProviderConfig,
    /// Tools declared by the caller, lowest priority in the catalog.
    pub declared_tools: Vec<Tool>,
}

impl TurnRequest {
    pub fn new(
        messages: Vec<Message>,
        server_url: impl Into<String>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            messages,
            server_url: Some(server_url.into()),
            provider,
            declared_tools: Vec::new(),
        }
    }

    pub fn with_declared_tools(mut self, tools: Vec<Tool>) -> Self {
        self.declared_tools = tools;
        self
    }
}

/// A tool backend's self-description.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub info: ServerInfo,
    pub tools: Vec<Tool>,
}

/// Holds the HTTP client and settings shared across turns.
///
/// No per-turn state is kept: every [`Gateway::run`] rediscovers tools and
/// builds a fresh catalog.
#[derive(Debug, Clone)]
pub struct Gateway {
    http: reqwest::Client,
    settings: Arc<GatewaySettings>,
}

impl Gateway {
    pub fn new(settings: GatewaySettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    pub fn with_client(http: reqwest::Client, settings: GatewaySettings) -> Self {
        Self {
            http,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Validate and normalize a backend URL. Performs no network I/O.
    pub fn server_url(raw: Option<&str>) -> Result<ServerUrl> {
        match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => Ok(ServerUrl::parse(raw)?),
            _ => Err(Error::Configuration("no server URL provided".into())),
        }
    }

    /// Fetch server info and the tools it lists.
    pub async fn discover(&self, server: &ServerUrl) -> Result<Discovery> {
        let client = McpClient::new(self.http.clone(), server.clone())
            .with_timeout(self.settings.request_timeout());

        let info = client.info().await;
        let tools = client
            .list_tools()
            .await?
            .into_iter()
            .filter_map(|descriptor| remote_tool(descriptor, server))
            .collect();

        Ok(Discovery { info, tools })
    }

    /// Build this turn's catalog from declared, discovered and built-in tools.
    pub fn catalog(&self, declared: Vec<Tool>, discovered: Vec<Tool>) -> Catalog {
        Catalog::build(
            vec![
                ToolSource::declared(declared),
                ToolSource::new(SourceKind::Node, discovered),
                ToolSource::new(SourceKind::BuiltIn, builtin_tools(&self.settings.builtins)),
            ],
            &self.settings.exclude,
        )
    }

    fn executor(&self) -> ToolExecutor {
        ToolExecutor::new(self.http.clone(), Arc::clone(&self.settings))
    }

    /// Run one conversation turn.
    ///
    /// Configuration is validated before any network call. An empty catalog
    /// is rejected before the provider is contacted.
    #[instrument(skip_all, fields(provider = %request.provider.kind))]
    pub async fn run(&self, request: TurnRequest) -> Result<TurnOutcome> {
        let server = Self::server_url(request.server_url.as_deref())?;
        let provider =
            Adapter::from_config(&request.provider, self.http.clone(), self.settings.max_tokens)?;

        let discovery = self.discover(&server).await?;
        info!(
            server = %server,
            protocol = %discovery.info.protocol,
            version = %discovery.info.version,
            tools = discovery.tools.len(),
            "discovered tools"
        );

        let catalog = self.catalog(request.declared_tools, discovery.tools);
        info!(provider = %provider, tools = catalog.len(), "starting turn");

        Orchestrator::new(provider, self.executor())
            .run(&catalog, &request.messages)
            .await
    }
}

fn remote_tool(descriptor: ToolDescriptor, server: &ServerUrl) -> Option<Tool> {
    if descriptor.name.trim().is_empty() {
        warn!(server = %server, "skipping listed tool without a name");
        return None;
    }

    let mut tool = Tool::remote(descriptor.name, descriptor.description, server.clone());
    tool.schema = to_generic_schema(&descriptor.schema);
    Some(tool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{HandlerId, ParamType, ToolExecution};
    use crate::providers::ProviderKind;
    use mockito::Server;
    use serde_json::json;

    #[test]
    fn missing_or_malformed_server_url_is_configuration_error() {
        assert!(matches!(Gateway::server_url(None), Err(Error::Configuration(_))));
        assert!(matches!(Gateway::server_url(Some("  ")), Err(Error::Configuration(_))));
        assert!(matches!(
            Gateway::server_url(Some("http://")),
            Err(Error::Configuration(_))
        ));
        assert_eq!(
            Gateway::server_url(Some("localhost:3000")).unwrap().as_str(),
            "http://localhost:3000/"
        );
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_discovery() {
        let mut server = Server::new_async().await;
        let tools = server.mock("GET", "/tools").expect(0).create_async().await;

        let request = TurnRequest::new(
            vec![Message::user("hi")],
            server.url(),
            ProviderConfig::new(ProviderKind::OpenAi, ""),
        );
        let err = Gateway::new(GatewaySettings::default())
            .run(request)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "configuration_error");
        tools.assert_async().await;
    }

    #[tokio::test]
    async fn discovery_converts_listed_schemas() {
        let mut server = Server::new_async().await;
        let _info = server
            .mock("GET", "/")
            .with_status(404)
            .create_async()
            .await;
        let _tools = server
            .mock("GET", "/tools")
            .with_header("content-type", "application/json")
            .with_body(
                json!({"tools": [
                    {"name": "weather", "description": "Weather", "schema": {"city": {"type": {"type": "string"}}}},
                    {"name": "", "description": "nameless"}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = Gateway::new(GatewaySettings::default());
        let url = Gateway::server_url(Some(server.url().as_str())).unwrap();
        let discovery = gateway.discover(&url).await.unwrap();

        assert_eq!(discovery.info, ServerInfo::default());
        assert_eq!(discovery.tools.len(), 1);
        let tool = &discovery.tools[0];
        assert_eq!(tool.schema["city"].param_type, ParamType::String);
        assert_eq!(tool.execution, ToolExecution::Remote { server: url });
    }

    #[test]
    fn builtins_and_exclusions_shape_the_catalog() {
        let settings = GatewaySettings {
            builtins: vec![HandlerId::Calculator, HandlerId::Weather],
            exclude: vec!["weather".into()],
            ..GatewaySettings::default()
        };
        let catalog = Gateway::new(settings).catalog(Vec::new(), Vec::new());
        let names: Vec<_> = catalog.list().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["calculator", "list_available_tools"]);
    }
}

//! Tool execution.
//!
//! The executor never fails: remote errors, local handler errors, timeouts
//! and unknown names all become a failed [`ToolOutcome`] so the model can
//! answer around them.

mod calculator;
mod errors;
mod local;
mod parallel;
mod weather;

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use mcp::{ExecuteOutcome, McpClient, ServerUrl};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

pub use calculator::{CalcError, evaluate};
pub use errors::ToolError;
pub use parallel::PARALLEL_TOOL;

use crate::catalog::{Catalog, ToolExecution};
use crate::config::GatewaySettings;
use crate::model::{ToolCallRequest, ToolCallResult, ToolOutcome};
use crate::resolver::NameResolver;

/// Runs tool calls against a catalog snapshot.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    http: reqwest::Client,
    settings: Arc<GatewaySettings>,
}

impl ToolExecutor {
    pub fn new(http: reqwest::Client, settings: Arc<GatewaySettings>) -> Self {
        Self { http, settings }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Execute one provider-issued call.
    pub async fn execute(&self, catalog: &Catalog, call: &ToolCallRequest) -> ToolCallResult {
        let resolver = NameResolver::new(catalog);
        self.dispatch(catalog, &resolver, call).await
    }

    /// Execute calls concurrently, bounded by the configured concurrency.
    ///
    /// Returns exactly one result per call, in request order, each carrying
    /// its request's `id` regardless of which call finished first.
    pub async fn execute_all(
        &self,
        catalog: &Catalog,
        calls: &[ToolCallRequest],
    ) -> Vec<ToolCallResult> {
        let resolver = NameResolver::new(catalog);
        let completed: Vec<(usize, ToolCallResult)> = stream::iter(calls.iter().enumerate())
            .map(|(slot, call)| {
                let resolver = &resolver;
                async move { (slot, self.dispatch(catalog, resolver, call).await) }
            })
            .buffer_unordered(self.settings.concurrency())
            .collect()
            .await;

        let mut slots: Vec<Option<ToolCallResult>> = vec![None; calls.len()];
        for (slot, result) in completed {
            slots[slot] = Some(result);
        }

        slots
            .into_iter()
            .zip(calls)
            .map(|(result, call)| {
                result.unwrap_or_else(|| ToolCallResult {
                    id: call.id.clone(),
                    tool_name: call.tool_name.clone(),
                    outcome: ToolOutcome::error("tool call produced no result"),
                })
            })
            .collect()
    }

    #[instrument(skip_all, fields(call_id = %call.id, tool = %call.tool_name))]
    async fn dispatch(
        &self,
        catalog: &Catalog,
        resolver: &NameResolver<'_>,
        call: &ToolCallRequest,
    ) -> ToolCallResult {
        let canonical = resolver.resolve(&call.tool_name);
        let outcome = match normalize_arguments(&call.arguments) {
            Err(e) => ToolOutcome::error(e.to_string()),
            Ok(arguments) if canonical == PARALLEL_TOOL => {
                parallel::run(self, catalog, resolver, &arguments).await
            }
            Ok(arguments) => self.run_tool(catalog, canonical, arguments).await,
        };

        match &outcome {
            ToolOutcome::Success { .. } => debug!(canonical, "tool call succeeded"),
            ToolOutcome::Error { message } => warn!(canonical, %message, "tool call failed"),
        }

        ToolCallResult {
            id: call.id.clone(),
            tool_name: canonical.to_string(),
            outcome,
        }
    }

    /// Run a single catalog tool by canonical name.
    async fn run_tool(&self, catalog: &Catalog, name: &str, arguments: Value) -> ToolOutcome {
        let tool = match catalog.get(name) {
            Ok(tool) => tool,
            Err(_) => return ToolOutcome::error(ToolError::NotFound(name.to_string()).to_string()),
        };

        let result = match &tool.execution {
            ToolExecution::Remote { server } => self.run_remote(server, name, arguments).await,
            ToolExecution::Local { handler } => {
                let timeout = self.settings.local_timeout();
                match tokio::time::timeout(timeout, local::run(self, catalog, *handler, &arguments))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ToolError::Timeout(self.settings.local_timeout_ms)),
                }
            }
        };

        match result {
            Ok(value) => ToolOutcome::success(value),
            Err(e) => ToolOutcome::error(e.to_string()),
        }
    }

    async fn run_remote(
        &self,
        server: &ServerUrl,
        name: &str,
        arguments: Value,
    ) -> Result<Value, ToolError> {
        let client = McpClient::new(self.http.clone(), server.clone())
            .with_timeout(self.settings.request_timeout());

        match client.execute(name, arguments).await {
            Ok(ExecuteOutcome::Success(value)) => Ok(value),
            Ok(ExecuteOutcome::Failure(text)) => Err(ToolError::Execution(text)),
            Err(e) => Err(ToolError::Execution(e.to_string())),
        }
    }
}

/// Missing arguments become an empty object; anything else must be one.
fn normalize_arguments(arguments: &Value) -> Result<Value, ToolError> {
    match arguments {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(arguments.clone()),
        Value::String(raw) => Err(ToolError::InvalidInput(format!(
            "arguments are not valid JSON: {raw}"
        ))),
        other => Err(ToolError::InvalidInput(format!(
            "arguments must be a JSON object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{INTROSPECTION_TOOL, Tool, ToolSource, calculator_tool};
    use mockito::Server;
    use serde_json::json;

    fn executor() -> ToolExecutor {
        ToolExecutor::new(reqwest::Client::new(), Arc::new(GatewaySettings::default()))
    }

    fn call(id: &str, name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: id.into(),
            tool_name: name.into(),
            arguments,
        }
    }

    fn local_catalog() -> Catalog {
        let mut renamed = calculator_tool();
        renamed.name = "math.eval".into();
        Catalog::build(
            vec![ToolSource::declared(vec![calculator_tool(), renamed])],
            &[],
        )
    }

    #[tokio::test]
    async fn local_calculator_runs_in_process() {
        let result = executor()
            .execute(&local_catalog(), &call("c1", "calculator", json!({"expression": "6 * 7"})))
            .await;
        assert!(result.is_ok());
        assert_eq!(result.id, "c1");
        assert_eq!(result.outcome.to_value()["result"], 42);
    }

    #[tokio::test]
    async fn sanitized_names_resolve_to_canonical() {
        let result = executor()
            .execute(&local_catalog(), &call("c1", "math_eval", json!({"expression": "1"})))
            .await;
        assert!(result.is_ok());
        assert_eq!(result.tool_name, "math.eval");
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failed_result() {
        let result = executor()
            .execute(&local_catalog(), &call("c1", "nope", json!({})))
            .await;
        assert!(!result.is_ok());
        assert_eq!(result.outcome, ToolOutcome::error("tool not found: nope"));
    }

    #[tokio::test]
    async fn unparseable_arguments_fail_only_that_call() {
        let result = executor()
            .execute(&local_catalog(), &call("c1", "calculator", json!("{not json")))
            .await;
        assert_eq!(
            result.outcome,
            ToolOutcome::error("invalid input: arguments are not valid JSON: {not json")
        );
    }

    #[tokio::test]
    async fn handler_errors_do_not_escape() {
        let result = executor()
            .execute(&local_catalog(), &call("c1", "calculator", json!({"expression": "1/0"})))
            .await;
        assert_eq!(
            result.outcome,
            ToolOutcome::error("execution failed: division by zero")
        );

        let result = executor()
            .execute(&local_catalog(), &call("c2", "calculator", Value::Null))
            .await;
        assert_eq!(
            result.outcome,
            ToolOutcome::error("invalid input: expression is required")
        );
    }

    #[tokio::test]
    async fn remote_server_error_becomes_failure() {
        let mut server = Server::new_async().await;
        let _execute = server
            .mock("POST", "/execute")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let catalog = Catalog::build(
            vec![ToolSource::declared(vec![Tool::remote(
                "weather",
                "",
                ServerUrl::parse(&server.url()).unwrap(),
            )])],
            &[],
        );
        let result = executor()
            .execute(&catalog, &call("w1", "weather", json!({"city": "Paris"})))
            .await;
        assert!(!result.is_ok());
        assert!(result.outcome.to_content().contains("500"));
    }

    #[tokio::test]
    async fn parallel_preserves_order_and_isolates_failures() {
        let arguments = json!({
            "tools_to_use": [
                {"tool_name": "calculator", "parameters": {"expression": "1 + 1"}},
                {"tool_name": "calculator", "parameters": {"expression": "1 / 0"}},
                {"tool_name": "math_eval", "parameters": {"expression": "3 * 3"}},
                {"tool_name": PARALLEL_TOOL, "parameters": {}},
            ]
        });
        let result = executor()
            .execute(&local_catalog(), &call("p1", PARALLEL_TOOL, arguments))
            .await;

        assert!(result.is_ok());
        assert_eq!(result.tool_name, PARALLEL_TOOL);
        let slots = result.outcome.to_value();
        let slots = slots.as_array().unwrap();
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0]["result"]["result"], 2);
        assert_eq!(slots[1]["tool_name"], "calculator");
        assert_eq!(slots[1]["error"], "execution failed: division by zero");
        assert_eq!(slots[2]["tool_name"], "math_eval");
        assert_eq!(slots[2]["result"]["result"], 9);
        assert!(slots[3]["error"].as_str().unwrap().contains("cannot be nested"));
    }

    #[tokio::test]
    async fn parallel_rejects_malformed_arguments() {
        let result = executor()
            .execute(&local_catalog(), &call("p1", PARALLEL_TOOL, json!({"tools": []})))
            .await;
        assert!(!result.is_ok());
    }

    #[tokio::test]
    async fn execute_all_returns_one_result_per_call() {
        let catalog = local_catalog();
        let calls = vec![
            call("a", "calculator", json!({"expression": "1"})),
            call("b", "missing", json!({})),
            call("c", INTROSPECTION_TOOL, json!({})),
        ];
        let results = executor().execute_all(&catalog, &calls).await;
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(results[0].is_ok());
        assert!(!results[1].is_ok());
        assert_eq!(results[2].outcome.to_value()["total_tools"], 2);
    }
}

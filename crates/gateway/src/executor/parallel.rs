//! The `multi_tool_use_parallel` pseudo-tool.

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ToolError, ToolExecutor, normalize_arguments};
use crate::catalog::Catalog;
use crate::model::ToolOutcome;
use crate::resolver::NameResolver;

/// Reserved name of the parallel fan-out pseudo-tool.
pub const PARALLEL_TOOL: &str = "multi_tool_use_parallel";

#[derive(Debug, Deserialize)]
struct ParallelArgs {
    tools_to_use: Vec<SubCall>,
}

#[derive(Debug, Deserialize)]
struct SubCall {
    tool_name: String,
    #[serde(default)]
    parameters: Value,
}

/// Run every sub-call concurrently and report them in input order.
///
/// A failed sub-call occupies its own slot as `{tool_name, error}`; the
/// others are unaffected.
pub(super) async fn run(
    executor: &ToolExecutor,
    catalog: &Catalog,
    resolver: &NameResolver<'_>,
    arguments: &Value,
) -> ToolOutcome {
    let args: ParallelArgs = match serde_json::from_value(arguments.clone()) {
        Ok(args) => args,
        Err(e) => return ToolOutcome::error(ToolError::InvalidInput(e.to_string()).to_string()),
    };

    let mut completed: Vec<(usize, Value)> = stream::iter(args.tools_to_use.iter().enumerate())
        .map(|(slot, sub)| async move {
            let canonical = resolver.resolve(&sub.tool_name);
            let outcome = if canonical == PARALLEL_TOOL {
                ToolOutcome::error(
                    ToolError::InvalidInput(format!("{PARALLEL_TOOL} cannot be nested")).to_string(),
                )
            } else {
                match normalize_arguments(&sub.parameters) {
                    Ok(parameters) => executor.run_tool(catalog, canonical, parameters).await,
                    Err(e) => ToolOutcome::error(e.to_string()),
                }
            };
            (slot, slot_value(&sub.tool_name, outcome))
        })
        .buffer_unordered(executor.settings.concurrency())
        .collect()
        .await;

    completed.sort_by_key(|(slot, _)| *slot);
    ToolOutcome::success(Value::Array(
        completed.into_iter().map(|(_, value)| value).collect(),
    ))
}

fn slot_value(tool_name: &str, outcome: ToolOutcome) -> Value {
    match outcome {
        ToolOutcome::Success { value } => json!({ "tool_name": tool_name, "result": value }),
        ToolOutcome::Error { message } => json!({ "tool_name": tool_name, "error": message }),
    }
}

//! In-process handlers.
//!
//! The registry is closed: each [`HandlerId`] maps to compiled code. Nothing
//! supplied at request time is ever evaluated as code.

use serde_json::{Value, json};

use super::{ToolError, ToolExecutor, calculator, weather};
use crate::catalog::{Catalog, HandlerId, introspect};

pub(super) async fn run(
    executor: &ToolExecutor,
    catalog: &Catalog,
    handler: HandlerId,
    arguments: &Value,
) -> Result<Value, ToolError> {
    match handler {
        HandlerId::Introspection => {
            let category = arguments.get("category").and_then(Value::as_str);
            Ok(introspect(catalog, category))
        }
        HandlerId::Calculator => {
            let expression = match arguments.get("expression") {
                Some(Value::String(expression)) => expression.clone(),
                Some(Value::Number(number)) => number.to_string(),
                _ => return Err(ToolError::InvalidInput("expression is required".into())),
            };
            let result = calculator::evaluate(&expression)
                .map_err(|e| ToolError::Execution(e.to_string()))?;
            Ok(json!({ "expression": expression, "result": calculator::to_json(result) }))
        }
        HandlerId::Weather => {
            let city = arguments
                .get("city")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|city| !city.is_empty())
                .ok_or_else(|| ToolError::InvalidInput("city is required".into()))?;
            weather::lookup(&executor.http, &executor.settings, city).await
        }
    }
}

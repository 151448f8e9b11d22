//! Tools compiled into the gateway.

use serde_json::{Value, json};

use super::types::{HandlerId, ParamSpec, Tool};
use super::Catalog;

/// Reserved name of the introspection tool.
pub const INTROSPECTION_TOOL: &str = "list_available_tools";

/// Lists every other tool so a model can discover capabilities instead of
/// inventing them.
pub fn introspection_tool() -> Tool {
    Tool::local(
        INTROSPECTION_TOOL,
        "Get a comprehensive list of all tools available on this server. Use this tool when \
         the user asks what tools are available, what capabilities the assistant has, or what \
         functions can be performed.",
        HandlerId::Introspection,
    )
    .param(
        "category",
        ParamSpec::string(
            "Optional category filter (e.g., 'weather', 'database'). Leave empty to list all tools.",
        ),
    )
}

pub fn weather_tool() -> Tool {
    Tool::local(
        "weather",
        "Get current weather information for any city or location worldwide. Use this tool \
         whenever a user asks about weather, temperature, conditions, humidity, or wind for a \
         specific location.",
        HandlerId::Weather,
    )
    .param(
        "city",
        ParamSpec::string(
            "The name of the city or location to get weather information for. Examples: \
             'Paris', 'New York', 'Tokyo'.",
        ),
    )
}

pub fn calculator_tool() -> Tool {
    Tool::local(
        "calculator",
        "Evaluate an arithmetic expression. Supports + - * / % ^ and parentheses.",
        HandlerId::Calculator,
    )
    .param(
        "expression",
        ParamSpec::string("The arithmetic expression to evaluate, e.g. '(2 + 3) * 4'."),
    )
}

/// Tools for the given local handlers.
///
/// Introspection is skipped; every catalog already carries it.
pub fn builtin_tools(handlers: &[HandlerId]) -> Vec<Tool> {
    let mut tools: Vec<Tool> = Vec::with_capacity(handlers.len());
    for handler in handlers {
        let tool = match handler {
            HandlerId::Introspection => continue,
            HandlerId::Weather => weather_tool(),
            HandlerId::Calculator => calculator_tool(),
        };
        if !tools.iter().any(|t| t.name == tool.name) {
            tools.push(tool);
        }
    }
    tools
}

/// Describe the catalog's tools, optionally filtered by `category`.
///
/// The filter is a case-insensitive substring match on name or description.
/// The introspection tool never lists itself.
pub fn introspect(catalog: &Catalog, category: Option<&str>) -> Value {
    let category = category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_lowercase);

    let matching: Vec<&Tool> = catalog
        .list()
        .iter()
        .filter(|tool| tool.name != INTROSPECTION_TOOL)
        .filter(|tool| match &category {
            Some(category) => {
                tool.name.to_lowercase().contains(category)
                    || tool.description.to_lowercase().contains(category)
            }
            None => true,
        })
        .collect();

    let tools: Vec<Value> = matching
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": describe(tool),
                "parameters": parameter_lines(tool),
            })
        })
        .collect();

    let readable = matching
        .iter()
        .map(|tool| {
            format!(
                "Tool: {}\nDescription: {}{}",
                tool.name,
                describe(tool),
                parameter_lines(tool)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let heading = match &category {
        Some(category) => format!("Available tools in category \"{category}\":"),
        None => "Available tools:".to_string(),
    };

    json!({
        "total_tools": matching.len(),
        "category": category.as_deref().unwrap_or("all"),
        "tools": tools,
        "formatted_response": format!("{heading}\n\n{readable}"),
    })
}

fn describe(tool: &Tool) -> &str {
    if tool.description.is_empty() {
        "No description available"
    } else {
        &tool.description
    }
}

fn parameter_lines(tool: &Tool) -> String {
    if tool.schema.is_empty() {
        return String::new();
    }
    let lines = tool
        .schema
        .iter()
        .map(|(name, spec)| {
            let description = if spec.description.is_empty() {
                "No description"
            } else {
                &spec.description
            };
            format!("- {name} ({}): {description}", spec.param_type)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("\nParameters:\n{lines}")
}

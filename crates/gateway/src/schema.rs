//! Translation between catalog schemas and provider JSON Schema dialects.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::catalog::{Catalog, ParamSpec, ParamType, Tool};
use crate::executor::PARALLEL_TOOL;
use crate::resolver::sanitize;

/// Tool-definition dialect of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `{type: "function", function: {name, description, parameters}}`
    OpenAi,
    /// `{name, description, input_schema}`
    Anthropic,
}

/// A provider-neutral tool definition with a sanitized name.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the arguments.
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn from_tool(tool: &Tool) -> Self {
        Self {
            name: sanitize(&tool.name).into_owned(),
            description: tool.description.clone(),
            parameters: parameters_schema(tool),
        }
    }

    /// Render in a provider's dialect.
    pub fn to_provider_schema(&self, dialect: Dialect) -> Value {
        match dialect {
            Dialect::OpenAi => json!({
                "type": "function",
                "function": {
                    "name": self.name,
                    "description": self.description,
                    "parameters": self.parameters,
                }
            }),
            Dialect::Anthropic => json!({
                "name": self.name,
                "description": self.description,
                "input_schema": self.parameters,
            }),
        }
    }
}

/// Definitions for every catalog tool plus the parallel pseudo-tool.
pub fn tool_definitions(catalog: &Catalog) -> Vec<ToolDefinition> {
    let mut definitions: Vec<ToolDefinition> =
        catalog.list().iter().map(ToolDefinition::from_tool).collect();
    let names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
    let parallel = parallel_definition(&names);
    definitions.push(parallel);
    definitions
}

/// JSON Schema for a tool's arguments.
///
/// Every declared parameter is required.
pub fn parameters_schema(tool: &Tool) -> Value {
    let properties: Map<String, Value> = tool
        .schema
        .iter()
        .map(|(name, spec)| (name.clone(), param_schema(name, spec)))
        .collect();
    let required: Vec<&String> = tool.schema.keys().collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn param_schema(name: &str, spec: &ParamSpec) -> Value {
    let mut schema = Map::new();
    if let Some(json_type) = spec.param_type.json_type() {
        schema.insert("type".into(), json!(json_type));
    }

    let description = if spec.description.is_empty() {
        format!("Parameter: {name}")
    } else {
        spec.description.clone()
    };
    schema.insert("description".into(), json!(description));

    if spec.param_type == ParamType::Array {
        schema.insert("items".into(), json!({ "type": "string" }));
    }

    if let Some(values) = &spec.enum_values {
        if spec.param_type.is_scalar() {
            schema.insert("enum".into(), json!(values));
        }
    }

    Value::Object(schema)
}

fn parallel_definition(tool_names: &[&str]) -> ToolDefinition {
    ToolDefinition {
        name: PARALLEL_TOOL.to_string(),
        description: "Use this to execute multiple tools in parallel".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "tools_to_use": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "tool_name": { "type": "string", "enum": tool_names },
                            "parameters": { "type": "object" }
                        },
                        "required": ["tool_name", "parameters"]
                    }
                }
            },
            "required": ["tools_to_use"]
        }),
    }
}

/// Convert a third-party parameter description into catalog form.
///
/// Accepts a JSON Schema object (`{type: "object", properties: {...}}`), a
/// flat map (`{city: {type: "string"}}`), or the nested legacy form
/// (`{city: {type: {type: "string"}}}`). A missing type means `string`.
pub fn to_generic_schema(schema: &Value) -> BTreeMap<String, ParamSpec> {
    let is_json_schema = schema.get("type").and_then(Value::as_str) == Some("object");
    let properties = match schema.get("properties").and_then(Value::as_object) {
        Some(properties) => properties,
        None if is_json_schema => return BTreeMap::new(),
        None => match schema.as_object() {
            Some(map) => map,
            None => return BTreeMap::new(),
        },
    };

    properties
        .iter()
        .map(|(name, prop)| (name.clone(), param_from_json(prop)))
        .collect()
}

fn param_from_json(prop: &Value) -> ParamSpec {
    let param_type = match prop.get("type") {
        Some(Value::String(name)) => ParamType::from_json_type(name),
        Some(Value::Object(nested)) => nested
            .get("type")
            .and_then(Value::as_str)
            .map(ParamType::from_json_type)
            .unwrap_or(ParamType::String),
        Some(_) | None => ParamType::String,
    };

    let description = prop
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let enum_values = prop.get("enum").and_then(Value::as_array).map(|values| {
        values
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    });

    ParamSpec {
        param_type,
        description,
        enum_values,
    }
}

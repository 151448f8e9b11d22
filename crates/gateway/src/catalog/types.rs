//! Tool and parameter types.

use std::collections::BTreeMap;
use std::fmt;

use mcp::ServerUrl;
use serde::{Deserialize, Serialize};

/// Shape of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

impl ParamType {
    /// Map a JSON Schema `type` keyword.
    ///
    /// `integer` folds into `Number`; unrecognized names become `Any`.
    pub fn from_json_type(name: &str) -> Self {
        match name {
            "string" => Self::String,
            "number" | "integer" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => Self::Any,
        }
    }

    /// The JSON Schema `type` keyword, `None` for `Any`.
    pub fn json_type(self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Array => Some("array"),
            Self::Object => Some("object"),
            Self::Any => None,
        }
    }

    /// Whether an `enum` constraint applies to this type.
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::String | Self::Number | Self::Boolean | Self::Any)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type().unwrap_or("any"))
    }
}

/// A declared tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl ParamSpec {
    pub fn new(param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            param_type,
            description: description.into(),
            enum_values: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new(ParamType::String, description)
    }

    pub fn with_enum(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Built-in behaviors compiled into the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerId {
    Introspection,
    Weather,
    Calculator,
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Introspection => write!(f, "introspection"),
            Self::Weather => write!(f, "weather"),
            Self::Calculator => write!(f, "calculator"),
        }
    }
}

/// Where a tool runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolExecution {
    /// `POST {server}/execute`.
    Remote { server: ServerUrl },
    /// An in-process handler from the fixed registry.
    Local { handler: HandlerId },
}

/// A named, schema-described capability.
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub schema: BTreeMap<String, ParamSpec>,
    pub execution: ToolExecution,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        execution: ToolExecution,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: BTreeMap::new(),
            execution,
        }
    }

    pub fn remote(
        name: impl Into<String>,
        description: impl Into<String>,
        server: ServerUrl,
    ) -> Self {
        Self::new(name, description, ToolExecution::Remote { server })
    }

    pub fn local(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: HandlerId,
    ) -> Self {
        Self::new(name, description, ToolExecution::Local { handler })
    }

    pub fn param(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.schema.insert(name.into(), spec);
        self
    }
}

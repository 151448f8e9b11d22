//! Tool catalog.
//!
//! A catalog is an immutable, name-unique, ordered snapshot of every tool a
//! turn may use. It is built fresh for each request from prioritized
//! sources; later sources override earlier ones by name.

mod builtin;
mod types;

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

pub use builtin::{
    INTROSPECTION_TOOL, builtin_tools, calculator_tool, introspect, introspection_tool,
    weather_tool,
};
pub use types::{HandlerId, ParamSpec, ParamType, Tool, ToolExecution};

use crate::{Error, Result};

/// Origin of a batch of tools, in ascending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    /// Tools the caller declared explicitly.
    Declared,
    /// Tools discovered from nodes, including those a remote server lists.
    Node,
    /// Tools discovered from workflow definitions.
    Workflow,
    /// Tools compiled into the gateway.
    BuiltIn,
}

/// A batch of tools from one origin.
#[derive(Debug, Clone)]
pub struct ToolSource {
    pub kind: SourceKind,
    pub tools: Vec<Tool>,
}

impl ToolSource {
    pub fn new(kind: SourceKind, tools: Vec<Tool>) -> Self {
        Self { kind, tools }
    }

    pub fn declared(tools: Vec<Tool>) -> Self {
        Self::new(SourceKind::Declared, tools)
    }
}

/// An immutable snapshot of the tools available to one turn.
#[derive(Debug, Clone)]
pub struct Catalog {
    tools: Vec<Tool>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from `sources`, dropping names listed in `exclude`.
    ///
    /// Sources apply in [`SourceKind`] order regardless of the order given.
    /// An overridden tool keeps its original position. The introspection
    /// tool is always appended last and cannot be excluded or replaced.
    pub fn build(mut sources: Vec<ToolSource>, exclude: &[String]) -> Self {
        sources.sort_by_key(|source| source.kind);
        let exclude: HashSet<&str> = exclude.iter().map(String::as_str).collect();

        let mut catalog = Self {
            tools: Vec::new(),
            index: HashMap::new(),
        };

        for source in sources {
            for tool in source.tools {
                if tool.name == INTROSPECTION_TOOL {
                    warn!(kind = ?source.kind, "ignoring tool using the reserved introspection name");
                    continue;
                }
                if exclude.contains(tool.name.as_str()) {
                    debug!(tool = %tool.name, "excluded from catalog");
                    continue;
                }
                catalog.insert(tool);
            }
        }

        catalog.insert(introspection_tool());
        debug!(count = catalog.tools.len(), "catalog built");
        catalog
    }

    fn insert(&mut self, tool: Tool) {
        match self.index.get(&tool.name) {
            Some(&position) => {
                debug!(tool = %tool.name, "overriding earlier definition");
                self.tools[position] = tool;
            }
            None => {
                self.index.insert(tool.name.clone(), self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Tools in catalog order.
    pub fn list(&self) -> &[Tool] {
        &self.tools
    }

    /// Look up a tool by canonical name.
    pub fn get(&self, name: &str) -> Result<&Tool> {
        self.index
            .get(name)
            .map(|&position| &self.tools[position])
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when no tool besides the introspection tool is present.
    pub fn is_empty(&self) -> bool {
        self.tools.iter().all(|tool| tool.name == INTROSPECTION_TOOL)
    }
}

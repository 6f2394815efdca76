//! Tool registry: ordered name → descriptor mapping.
//!
//! The registry is populated once at startup, before the server loop begins,
//! and is read-only thereafter. Each descriptor carries the metadata exposed
//! through `tools/list` plus the invoke closure, which is never serialised.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::ToolError;

/// The invoke function of a tool.
///
/// Takes the `arguments` object of a `tools/call` request and returns either
/// a result value (string or structured) or a typed failure. The server runs
/// on a single thread, so handlers may capture `Rc`-shared resources.
pub type ToolHandler = Box<dyn Fn(&Map<String, Value>) -> Result<Value, ToolError>>;

/// A registered tool: name, description, input schema, invoke function.
pub struct Tool {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema describing the accepted arguments.
    pub input_schema: Value,
    /// The invoke function.
    handler: ToolHandler,
}

impl Tool {
    /// Creates a new tool descriptor.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(&Map<String, Value>) -> Result<Value, ToolError> + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler: Box::new(handler),
        }
    }

    /// Invokes the tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Propagates whatever failure the tool implementation raises.
    pub fn invoke(&self, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        (self.handler)(arguments)
    }

    /// Returns the externally visible descriptor for `tools/list`.
    ///
    /// The invoke function is deliberately absent.
    #[must_use]
    pub fn definition(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema,
        })
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// The immutable, startup-populated mapping from tool name to descriptor.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Tool>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a tool descriptor.
    ///
    /// Duplicate names overwrite the prior entry, last write wins; the tool
    /// keeps its original position in the listing order.
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Returns all tool definitions in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<Value> {
        self.tools.values().map(Tool::definition).collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

//! Workspace tool implementations.
//!
//! Each tool is an opaque callable from the protocol engine's point of
//! view: a name, a description, an input schema, and a synchronous invoke
//! function. [`build_registry`] wires the implementations to their shared
//! resources and registers them in a fixed order at startup.
//!
//! - [`database`] — SQLite introspection over a lazily opened handle
//! - [`shell`] — allow-listed command execution
//! - [`logs`] — log file tailing
//! - [`models`] — entity class scanning

pub mod database;
pub mod logs;
pub mod models;
pub mod shell;

use std::rc::Rc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::Config;
use crate::error::ToolError;
use crate::mcp::registry::{Tool, ToolRegistry};

use database::Database;
use logs::LogTailer;
use models::ModelScanner;
use shell::CommandRunner;

/// Deserialises a tool's arguments object into a typed params struct.
fn parse_args<T>(args: &Map<String, Value>) -> Result<T, ToolError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(Value::Object(args.clone()))
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Parameters for the `describe_table` tool.
#[derive(Debug, Deserialize)]
struct DescribeTableParams {
    /// Table to describe.
    table: String,
}

/// Parameters for the `query_database` tool.
#[derive(Debug, Deserialize)]
struct QueryDatabaseParams {
    /// The SQL text to run.
    sql: String,
    /// Optional row cap, clamped to the configured maximum.
    #[serde(default)]
    max_rows: Option<usize>,
}

/// Parameters for the `run_command` tool.
#[derive(Debug, Deserialize)]
struct RunCommandParams {
    /// Program to run, must be allow-listed.
    command: String,
    /// Arguments passed to the program.
    #[serde(default)]
    args: Vec<String>,
}

/// Parameters for the `tail_log` tool.
#[derive(Debug, Deserialize)]
struct TailLogParams {
    /// Number of lines to return.
    #[serde(default)]
    lines: Option<usize>,
    /// Only count lines containing this substring.
    #[serde(default)]
    filter: Option<String>,
}

/// Builds the tool registry from the loaded configuration.
///
/// Registration order is fixed and user-visible through `tools/list`. The
/// database handle is shared by the three database tools and opened only
/// when one of them is first invoked.
#[must_use]
pub fn build_registry(config: &Config) -> ToolRegistry {
    let root = config.project_root_path();

    let database = Rc::new(Database::new(
        root.join(&config.database.path),
        config.database.max_rows,
    ));
    let runner = CommandRunner::new(root.clone(), &config.commands);
    let tailer = LogTailer::new(
        root.join(&config.logs.path),
        config.logs.default_lines,
        config.logs.max_lines,
    );
    let scanner = ModelScanner::new(root, config.models.paths.clone());

    let mut registry = ToolRegistry::new();

    let db = Rc::clone(&database);
    registry.register(Tool::new(
        "list_tables",
        "List all tables and views in the project database with their row counts.",
        json!({
            "type": "object",
            "properties": {}
        }),
        move |_args| db.list_tables(),
    ));

    let db = Rc::clone(&database);
    registry.register(Tool::new(
        "describe_table",
        "Describe one table in the project database: columns with types, \
         indexes, and foreign keys.",
        json!({
            "type": "object",
            "properties": {
                "table": {
                    "type": "string",
                    "description": "Name of the table to describe"
                }
            },
            "required": ["table"]
        }),
        move |args| {
            let params: DescribeTableParams = parse_args(args)?;
            db.describe_table(&params.table)
        },
    ));

    let db = Rc::clone(&database);
    registry.register(Tool::new(
        "query_database",
        "Run a read-only SQL query (SELECT/WITH/EXPLAIN/PRAGMA) against the \
         project database. Rows are returned as objects keyed by column name; \
         BLOB columns are base64-encoded.",
        json!({
            "type": "object",
            "properties": {
                "sql": {
                    "type": "string",
                    "description": "The SQL statement to run"
                },
                "max_rows": {
                    "type": "integer",
                    "description": "Optional: maximum rows to return (clamped to the configured cap)"
                }
            },
            "required": ["sql"]
        }),
        move |args| {
            let params: QueryDatabaseParams = parse_args(args)?;
            db.query(&params.sql, params.max_rows)
        },
    ));

    registry.register(Tool::new(
        "run_command",
        "Run an allow-listed program in the project root and capture its \
         exit code, stdout, and stderr.",
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Program name, must be on the configured allow-list"
                },
                "args": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Arguments passed to the program"
                }
            },
            "required": ["command"]
        }),
        move |args| {
            let params: RunCommandParams = parse_args(args)?;
            runner.run(&params.command, &params.args)
        },
    ));

    registry.register(Tool::new(
        "tail_log",
        "Return the last lines of the project log file, optionally only \
         lines containing a substring.",
        json!({
            "type": "object",
            "properties": {
                "lines": {
                    "type": "integer",
                    "description": "Optional: number of lines to return (clamped to the configured maximum)"
                },
                "filter": {
                    "type": "string",
                    "description": "Optional: only return lines containing this substring"
                }
            }
        }),
        move |args| {
            let params: TailLogParams = parse_args(args)?;
            tailer
                .tail(params.lines, params.filter.as_deref())
                .map(Value::String)
        },
    ));

    registry.register(Tool::new(
        "list_models",
        "Scan the project for entity class definitions (models) using the \
         configured glob patterns.",
        json!({
            "type": "object",
            "properties": {}
        }),
        move |_args| scanner.scan(),
    ));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_fixed_registration_order() {
        let registry = build_registry(&Config::default());

        let names: Vec<_> = registry
            .list()
            .into_iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "list_tables",
                "describe_table",
                "query_database",
                "run_command",
                "tail_log",
                "list_models",
            ]
        );
    }

    #[test]
    fn missing_required_argument_is_invalid_arguments() {
        let registry = build_registry(&Config::default());
        let tool = registry.lookup("describe_table").unwrap();

        let err = tool.invoke(&Map::new()).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn run_command_rejects_programs_off_the_allow_list() {
        let registry = build_registry(&Config::default());
        let tool = registry.lookup("run_command").unwrap();

        let mut args = Map::new();
        args.insert("command".to_string(), Value::String("rm".to_string()));
        let err = tool.invoke(&args).unwrap_err();
        assert!(matches!(err, ToolError::CommandNotAllowed { .. }));
    }

    #[test]
    fn schemas_describe_object_inputs() {
        let registry = build_registry(&Config::default());
        for definition in registry.list() {
            assert_eq!(definition["input_schema"]["type"], "object");
        }
    }
}

//! workbench-mcp: MCP server exposing a development workspace to AI assistants
//!
//! This library implements a stdio JSON-RPC tool server plus a suite of
//! workspace introspection tools: SQLite database inspection, allow-listed
//! shell commands, log tailing, and entity class scanning.
//!
//! # Architecture
//!
//! One long-lived client drives the server over newline-delimited JSON on
//! stdin/stdout. The protocol engine is a read-decode-dispatch-encode loop
//! over an immutable tool registry populated at startup; tool
//! implementations are opaque callables the engine never looks inside.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading, validation, first-run generation
//! - [`error`] — Error types
//! - [`mcp`] — MCP protocol implementation
//! - [`tools`] — Workspace tool implementations

pub mod config;
pub mod error;
pub mod mcp;
pub mod tools;

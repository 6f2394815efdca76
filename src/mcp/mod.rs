//! MCP protocol implementation.
//!
//! - [`protocol`] — JSON-RPC message types and the line codec
//! - [`transport`] — newline-delimited stdio transport
//! - [`registry`] — the startup-populated tool registry
//! - [`server`] — request dispatcher and main loop

pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;

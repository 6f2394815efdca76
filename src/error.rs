//! Error types for workbench-mcp.
//!
//! Two families: [`ConfigError`] for startup failures that abort the process,
//! and [`ToolError`] for tool invocation failures that are converted into
//! JSON-RPC error responses at the dispatcher boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Default configuration file could not be written on first run.
    #[error("failed to write default configuration file: {path}")]
    WriteError {
        /// Path the configuration file was written to.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors raised by tool implementations.
///
/// The dispatcher converts these into internal-error responses; none of them
/// terminate the server loop.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Tool arguments did not match the expected shape.
    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),

    /// SQLite reported an error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The configured database file does not exist.
    #[error("database file not found: {path}")]
    DatabaseNotFound {
        /// Path to the missing database file.
        path: PathBuf,
    },

    /// A named table does not exist in the database.
    #[error("no such table: {name}")]
    TableNotFound {
        /// The requested table name.
        name: String,
    },

    /// A table name failed identifier validation.
    #[error("invalid table name: {name}")]
    InvalidTableName {
        /// The rejected table name.
        name: String,
    },

    /// A query used a statement type other than the read-only set.
    #[error("query rejected: {reason}")]
    QueryRejected {
        /// Why the query was refused.
        reason: String,
    },

    /// A command is not on the configured allow-list.
    #[error("command not allowed: {name}")]
    CommandNotAllowed {
        /// The rejected program name.
        name: String,
    },

    /// A command could not be spawned.
    #[error("failed to run command '{name}': {source}")]
    CommandFailed {
        /// The program that failed to start.
        name: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configured log file does not exist.
    #[error("log file not found: {path}")]
    LogNotFound {
        /// Path to the missing log file.
        path: PathBuf,
    },

    /// A glob pattern failed to compile.
    #[error("invalid glob pattern '{pattern}': {source}")]
    BadPattern {
        /// The offending pattern.
        pattern: String,
        /// The underlying glob error.
        #[source]
        source: glob::PatternError,
    },

    /// Generic IO failure with context.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("invalid setting"));
    }

    #[test]
    fn tool_error_display() {
        let error = ToolError::CommandNotAllowed {
            name: "rm".to_string(),
        };
        assert_eq!(error.to_string(), "command not allowed: rm");

        let error = ToolError::TableNotFound {
            name: "users".to_string(),
        };
        assert!(error.to_string().contains("users"));
    }
}

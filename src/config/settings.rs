//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.
//! Every section is optional; omitted fields fall back to defaults that
//! suit a conventional project layout.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Directory the tools operate in. All other paths resolve against it.
    #[serde(default = "default_project_root")]
    pub project_root: String,

    /// Project database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log tailing settings.
    #[serde(default)]
    pub logs: LogsConfig,

    /// Model scanner settings.
    #[serde(default)]
    pub models: ModelsConfig,

    /// Shell command settings.
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            _schema: None,
            _comment: None,
            project_root: default_project_root(),
            database: DatabaseConfig::default(),
            logs: LogsConfig::default(),
            models: ModelsConfig::default(),
            commands: CommandsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Returns the project root as a path.
    #[must_use]
    pub fn project_root_path(&self) -> PathBuf {
        PathBuf::from(&self.project_root)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_rows == 0 {
            return Err(ConfigError::ValidationError {
                message: "database.max_rows must be at least 1".to_string(),
            });
        }

        if self.logs.default_lines == 0 || self.logs.max_lines == 0 {
            return Err(ConfigError::ValidationError {
                message: "logs.default_lines and logs.max_lines must be at least 1".to_string(),
            });
        }
        if self.logs.default_lines > self.logs.max_lines {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "logs.default_lines ({}) cannot exceed logs.max_lines ({})",
                    self.logs.default_lines, self.logs.max_lines
                ),
            });
        }

        if self.commands.max_output_bytes == 0 {
            return Err(ConfigError::ValidationError {
                message: "commands.max_output_bytes must be at least 1".to_string(),
            });
        }

        // Allow-listed commands are bare program names resolved via PATH;
        // a path separator would bypass the allow-list intent.
        for name in &self.commands.allowed {
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(ConfigError::ValidationError {
                    message: format!(
                        "commands.allowed entry '{name}' must be a bare program name"
                    ),
                });
            }
        }

        for pattern in &self.models.paths {
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(ConfigError::ValidationError {
                    message: format!("models.paths entry '{pattern}' is not a valid glob: {e}"),
                });
            }
        }

        Ok(())
    }
}

fn default_project_root() -> String {
    ".".to_string()
}

/// Project database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, relative to the project root.
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of rows returned by a single query.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_rows: default_max_rows(),
        }
    }
}

fn default_database_path() -> String {
    "data/app.db".to_string()
}

const fn default_max_rows() -> usize {
    200
}

/// Log tailing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogsConfig {
    /// Path to the log file, relative to the project root.
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Number of lines returned when the client does not ask for a count.
    #[serde(default = "default_log_lines")]
    pub default_lines: usize,

    /// Upper bound on the number of lines a single call may return.
    #[serde(default = "default_log_max_lines")]
    pub max_lines: usize,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            default_lines: default_log_lines(),
            max_lines: default_log_max_lines(),
        }
    }
}

fn default_log_path() -> String {
    "logs/app.log".to_string()
}

const fn default_log_lines() -> usize {
    50
}

const fn default_log_max_lines() -> usize {
    1000
}

/// Model scanner configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsConfig {
    /// Glob patterns (relative to the project root) for entity class files.
    #[serde(default = "default_model_paths")]
    pub paths: Vec<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            paths: default_model_paths(),
        }
    }
}

fn default_model_paths() -> Vec<String> {
    vec![
        "app/models/**/*.*".to_string(),
        "src/models/**/*.*".to_string(),
    ]
}

/// Shell command configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandsConfig {
    /// Program names the `run_command` tool may execute.
    #[serde(default = "default_allowed_commands")]
    pub allowed: Vec<String>,

    /// Per-stream cap on captured command output, in bytes.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            allowed: default_allowed_commands(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

fn default_allowed_commands() -> Vec<String> {
    ["git", "ls", "cat", "grep", "wc"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

const fn default_max_output_bytes() -> usize {
    65536
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.project_root, ".");
        assert_eq!(config.database.path, "data/app.db");
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "project_root": "/srv/app",
            "database": {
                "path": "var/app.sqlite3",
                "max_rows": 500
            },
            "logs": {
                "path": "var/log/app.log",
                "default_lines": 20,
                "max_lines": 200
            },
            "models": {
                "paths": ["app/models/**/*.py"]
            },
            "commands": {
                "allowed": ["git", "make"],
                "max_output_bytes": 4096
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.project_root, "/srv/app");
        assert_eq!(config.database.path, "var/app.sqlite3");
        assert_eq!(config.database.max_rows, 500);
        assert_eq!(config.logs.default_lines, 20);
        assert_eq!(config.models.paths, vec!["app/models/**/*.py"]);
        assert_eq!(config.commands.allowed, vec!["git", "make"]);
        assert_eq!(config.commands.max_output_bytes, 4096);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn database_config_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path, "data/app.db");
        assert_eq!(config.max_rows, 200);
    }

    #[test]
    fn logs_config_defaults() {
        let config = LogsConfig::default();
        assert_eq!(config.path, "logs/app.log");
        assert_eq!(config.default_lines, 50);
        assert_eq!(config.max_lines, 1000);
    }

    #[test]
    fn logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn reject_default_lines_above_max() {
        let json = r#"{
            "logs": {
                "default_lines": 500,
                "max_lines": 100
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_command_with_path_separator() {
        let json = r#"{
            "commands": {
                "allowed": ["/usr/bin/rm"]
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_invalid_model_glob() {
        let json = r#"{
            "models": {
                "paths": ["app/models/**/*.[p"]
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}

//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path specified via the CLI argument
//! 2. Default location:
//!    - **Linux/macOS:** `~/.workbench-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.workbench-mcp\config.json`
//!
//! # First Run
//!
//! When no CLI path is given and the default file does not exist yet, a
//! commented default configuration is written to the default location and
//! the server starts with built-in defaults. A missing *explicit* path is
//! still an error.

mod settings;

pub use settings::{
    CommandsConfig, Config, DatabaseConfig, LoggingConfig, LogsConfig, ModelsConfig,
};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Template written to the default location on first run.
///
/// Must stay parseable as [`Config`]; a test enforces this.
const DEFAULT_CONFIG_TEMPLATE: &str = r#"{
  "_comment": "workbench-mcp configuration. All paths are relative to project_root.",
  "project_root": ".",
  "database": {
    "path": "data/app.db",
    "max_rows": 200
  },
  "logs": {
    "path": "logs/app.log",
    "default_lines": 50,
    "max_lines": 1000
  },
  "models": {
    "paths": ["app/models/**/*.*", "src/models/**/*.*"]
  },
  "commands": {
    "allowed": ["git", "ls", "cat", "grep", "wc"],
    "max_output_bytes": 65536
  },
  "logging": {
    "level": "warn"
  }
}
"#;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.workbench-mcp/`
/// - **Windows:** `%USERPROFILE%\.workbench-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".workbench-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses a configuration file from an explicit path.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - Required fields are missing or invalid
pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}

/// Writes the commented default configuration to `path`, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Loads the configuration, generating the default file on first run.
///
/// With an explicit `path` this behaves exactly like [`load_file`]. Without
/// one, a missing default file is created from the template and built-in
/// defaults are returned.
///
/// # Errors
///
/// Returns an error if loading fails, the home directory cannot be
/// determined, or the first-run file cannot be written.
pub fn load_or_init(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => load_file(p),
        None => {
            let default_path = default_config_path().ok_or_else(|| ConfigError::NotFound {
                path: PathBuf::from("<default config path>"),
            })?;

            if default_path.exists() {
                load_file(&default_path)
            } else {
                write_default_config(&default_path)?;
                // Logging is not initialised until the config is loaded, so
                // report the first-run write directly on stderr.
                eprintln!(
                    "Created default configuration at {}",
                    default_path.display()
                );
                Ok(Config::default())
            }
        }
    }
}

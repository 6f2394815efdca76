//! Entity class scanner.
//!
//! Expands the configured glob patterns against the project root and looks
//! for class-like definitions, choosing a regex by file extension. The scan
//! reads files fresh on every call; the registry stays stateless.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::error::ToolError;

fn script_class_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:abstract\s+|final\s+)?class\s+([A-Za-z_][A-Za-z0-9_]*)")
            .expect("valid regex")
    })
}

fn ecma_class_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][A-Za-z0-9_$]*)")
            .expect("valid regex")
    })
}

fn rust_struct_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:pub(?:\([a-z]+\))?\s+)?struct\s+([A-Za-z_][A-Za-z0-9_]*)")
            .expect("valid regex")
    })
}

/// Picks the class-definition regex for a file extension.
fn pattern_for_extension(extension: &str) -> Option<&'static Regex> {
    match extension {
        "php" | "py" | "rb" => Some(script_class_pattern()),
        "js" | "jsx" | "ts" | "tsx" | "mjs" => Some(ecma_class_pattern()),
        "rs" => Some(rust_struct_pattern()),
        _ => None,
    }
}

/// Scans the project for entity class definitions.
#[derive(Debug, Clone)]
pub struct ModelScanner {
    /// Project root all patterns resolve against.
    root: PathBuf,
    /// Glob patterns relative to the root.
    patterns: Vec<String>,
}

impl ModelScanner {
    /// Creates a scanner over the given root and patterns.
    #[must_use]
    pub const fn new(root: PathBuf, patterns: Vec<String>) -> Self {
        Self { root, patterns }
    }

    /// Scans all configured patterns and returns the discovered classes.
    ///
    /// Unreadable files are skipped; paths in the result are relative to
    /// the project root, ordered by file then line.
    ///
    /// # Errors
    ///
    /// Returns a tool failure only for an invalid glob pattern.
    pub fn scan(&self) -> Result<Value, ToolError> {
        let mut found: Vec<(String, usize, String)> = Vec::new();
        let mut files_scanned = 0_usize;

        for pattern in &self.patterns {
            let absolute = self.root.join(pattern);
            let absolute = absolute.to_string_lossy();

            let entries = glob::glob(&absolute).map_err(|e| ToolError::BadPattern {
                pattern: pattern.clone(),
                source: e,
            })?;

            for entry in entries {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping unreadable glob entry");
                        continue;
                    }
                };
                if !path.is_file() {
                    continue;
                }

                files_scanned += 1;
                self.scan_file(&path, &mut found);
            }
        }

        found.sort();
        let models: Vec<Value> = found
            .into_iter()
            .map(|(file, line, name)| json!({"name": name, "file": file, "line": line}))
            .collect();

        Ok(json!({
            "models": models,
            "files_scanned": files_scanned,
        }))
    }

    /// Scans one file, appending `(relative path, line, class name)` hits.
    fn scan_file(&self, path: &Path, found: &mut Vec<(String, usize, String)>) {
        let Some(pattern) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(pattern_for_extension)
        else {
            return;
        };

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable file");
                return;
            }
        };

        let relative = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();

        for (index, line) in contents.lines().enumerate() {
            if let Some(captures) = pattern.captures(line) {
                found.push((relative.clone(), index + 1, captures[1].to_string()));
            }
        }
    }
}

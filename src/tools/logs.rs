//! Log file tailing.
//!
//! Streams the configured log file through a bounded window so memory use
//! stays proportional to the requested line count, not the file size.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::error::ToolError;

/// Tails the project log file.
#[derive(Debug, Clone)]
pub struct LogTailer {
    /// Path to the log file.
    path: PathBuf,
    /// Line count used when the caller does not specify one.
    default_lines: usize,
    /// Upper bound on lines per call.
    max_lines: usize,
}

impl LogTailer {
    /// Creates a tailer for the given log file.
    #[must_use]
    pub const fn new(path: PathBuf, default_lines: usize, max_lines: usize) -> Self {
        Self {
            path,
            default_lines,
            max_lines,
        }
    }

    /// Returns the last lines of the log as one newline-joined string.
    ///
    /// `lines` is clamped to the configured maximum. When `filter` is set,
    /// only lines containing that substring count toward the window.
    ///
    /// # Errors
    ///
    /// Returns a tool failure when the log file is missing or unreadable.
    pub fn tail(&self, lines: Option<usize>, filter: Option<&str>) -> Result<String, ToolError> {
        let requested = lines.map_or(self.default_lines, |n| n.clamp(1, self.max_lines));

        let file = File::open(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::LogNotFound {
                    path: self.path.clone(),
                }
            } else {
                ToolError::Io {
                    context: format!("failed to open log file {}", self.path.display()),
                    source: e,
                }
            }
        })?;

        let reader = BufReader::new(file);
        let mut window: VecDeque<String> = VecDeque::with_capacity(requested);

        for line in reader.lines() {
            let line = line.map_err(|e| ToolError::Io {
                context: format!("failed to read log file {}", self.path.display()),
                source: e,
            })?;

            if let Some(needle) = filter {
                if !line.contains(needle) {
                    continue;
                }
            }

            if window.len() == requested {
                window.pop_front();
            }
            window.push_back(line);
        }

        let collected: Vec<String> = window.into_iter().collect();
        Ok(collected.join("\n"))
    }
}

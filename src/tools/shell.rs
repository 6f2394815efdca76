//! Allow-listed shell command execution.
//!
//! Commands run synchronously in the project root with stdin closed and
//! both output streams captured. There is no timeout: a hanging child
//! stalls the server, which is the documented single-client trade-off.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde_json::{json, Value};

use crate::config::CommandsConfig;
use crate::error::ToolError;

/// Runs allow-listed programs inside the project root.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    /// Working directory for spawned commands.
    root: PathBuf,
    /// Programs that may be executed, bare names only.
    allowed: Vec<String>,
    /// Per-stream cap on captured output.
    max_output_bytes: usize,
}

impl CommandRunner {
    /// Creates a runner for the given project root and command settings.
    #[must_use]
    pub fn new(root: PathBuf, config: &CommandsConfig) -> Self {
        Self {
            root,
            allowed: config.allowed.clone(),
            max_output_bytes: config.max_output_bytes,
        }
    }

    /// Runs `command` with `args`, capturing exit status and output.
    ///
    /// # Errors
    ///
    /// Returns a tool failure when the program is not allow-listed or
    /// cannot be spawned. A nonzero exit status is not a failure; it is
    /// reported in the result.
    pub fn run(&self, command: &str, args: &[String]) -> Result<Value, ToolError> {
        if !self.allowed.iter().any(|a| a == command) {
            return Err(ToolError::CommandNotAllowed {
                name: command.to_string(),
            });
        }

        tracing::debug!(command, ?args, "running project command");

        let output = Command::new(command)
            .args(args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ToolError::CommandFailed {
                name: command.to_string(),
                source: e,
            })?;

        let (stdout, stdout_truncated) = capture(&output.stdout, self.max_output_bytes);
        let (stderr, stderr_truncated) = capture(&output.stderr, self.max_output_bytes);

        Ok(json!({
            "command": command,
            "args": args,
            "exit_code": output.status.code(),
            "stdout": stdout,
            "stderr": stderr,
            "stdout_truncated": stdout_truncated,
            "stderr_truncated": stderr_truncated,
        }))
    }
}

/// Lossily decodes a captured stream, truncating it to `max_bytes`.
fn capture(bytes: &[u8], max_bytes: usize) -> (String, bool) {
    if bytes.len() <= max_bytes {
        return (String::from_utf8_lossy(bytes).into_owned(), false);
    }

    let mut text = String::from_utf8_lossy(&bytes[..max_bytes]).into_owned();
    text.push_str("\n[output truncated]");
    (text, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(allowed: &[&str]) -> CommandRunner {
        let config = CommandsConfig {
            allowed: allowed.iter().map(ToString::to_string).collect(),
            max_output_bytes: 65536,
        };
        CommandRunner::new(PathBuf::from("."), &config)
    }

    #[test]
    fn disallowed_command_is_rejected() {
        let err = runner(&["ls"]).run("rm", &[]).unwrap_err();
        assert!(matches!(err, ToolError::CommandNotAllowed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn runs_allowed_command() {
        let result = runner(&["echo"])
            .run("echo", &["hello".to_string()])
            .unwrap();

        assert_eq!(result["exit_code"], 0);
        assert!(result["stdout"].as_str().unwrap().contains("hello"));
        assert_eq!(result["stdout_truncated"], false);
    }

    #[cfg(unix)]
    #[test]
    fn missing_program_is_a_spawn_failure() {
        let err = runner(&["definitely-not-a-real-program"])
            .run("definitely-not-a-real-program", &[])
            .unwrap_err();
        assert!(matches!(err, ToolError::CommandFailed { .. }));
    }

    #[test]
    fn capture_truncates_long_output() {
        let bytes = vec![b'x'; 100];
        let (text, truncated) = capture(&bytes, 10);
        assert!(truncated);
        assert!(text.starts_with("xxxxxxxxxx"));
        assert!(text.ends_with("[output truncated]"));
    }

    #[test]
    fn capture_keeps_short_output() {
        let (text, truncated) = capture(b"ok", 10);
        assert_eq!(text, "ok");
        assert!(!truncated);
    }
}

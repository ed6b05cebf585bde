//! Shell tool: execute system commands.
//!
//! Runs through `sh -c` (or `cmd /C` on Windows) with an optional working
//! directory and a wall-clock timeout. The child is killed if the timeout
//! fires.

use std::time::Duration;

use async_trait::async_trait;
use taskforge_core::error::ToolError;
use taskforge_core::tool::{Tool, ToolResult};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::str_arg;

pub const DEFAULT_SHELL_TIMEOUT_SECS: u64 = 30;

/// Execute shell commands with a timeout.
pub struct ShellTool {
    name: String,
    timeout: Duration,
}

impl ShellTool {
    /// The tool is registered under `name` (`run_command` or `run_cli_command`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timeout: Duration::from_secs(DEFAULT_SHELL_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(command: &str) -> Command {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Run a shell command and return stdout, stderr and the exit code."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                },
                "cwd": {
                    "type": "string",
                    "description": "Working directory (default: current directory)"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let command = str_arg(&arguments, "command")?;

        let mut cmd = Self::command(command);
        cmd.kill_on_drop(true);
        if let Some(cwd) = arguments["cwd"].as_str() {
            cmd.current_dir(cwd);
        }

        debug!(tool = %self.name, command = %command, "Executing shell command");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Ok(ToolResult::failure(format!("Error running command: {e}")));
            }
            Err(_) => {
                let secs = self.timeout.as_secs();
                warn!(command = %command, timeout_secs = secs, "Command timed out");
                return Ok(ToolResult::failure(format!(
                    "Command timed out after {secs} seconds"
                )));
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        let payload = serde_json::json!({
            "stdout": String::from_utf8_lossy(&output.stdout),
            "stderr": String::from_utf8_lossy(&output.stderr),
            "exit_code": exit_code,
            "command": command,
        });

        if output.status.success() {
            Ok(ToolResult::ok(payload))
        } else {
            warn!(command = %command, exit_code, "Command failed");
            Ok(ToolResult::failure_with(
                payload,
                format!("Command exited with code {exit_code}"),
            ))
        }
    }
}

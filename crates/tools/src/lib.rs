//! Built-in tool implementations for TaskForge.
//!
//! Tools give the agent the ability to interact with the workspace:
//! read and write files, move them around, search a directory tree,
//! and run shell commands.
//!
//! Two registries are provided. The single-agent ReAct engine binds the
//! basic set; the plan orchestrator's tool specialist binds the full set,
//! where the shell tool goes by `run_cli_command`.

pub mod file_ops;
pub mod file_read;
pub mod file_write;
pub mod grep;
pub mod shell;

use std::time::Duration;

use taskforge_core::error::ToolError;
use taskforge_core::tool::ToolRegistry;

pub use file_ops::{CopyFileTool, MoveFileTool, RenameFileTool};
pub use file_read::{ReadFileRangeTool, ReadFileTool};
pub use file_write::{CreateFolderTool, WriteFileTool};
pub use grep::GrepTool;
pub use shell::{DEFAULT_SHELL_TIMEOUT_SECS, ShellTool};

/// Tools for the single-agent loop: read_file, write_file, create_folder,
/// run_command.
pub fn basic_registry(shell_timeout: Duration) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ReadFileTool));
    registry.register(Box::new(WriteFileTool));
    registry.register(Box::new(CreateFolderTool));
    registry.register(Box::new(ShellTool::new("run_command").with_timeout(shell_timeout)));
    registry
}

/// Every built-in tool, as bound by the orchestrator's tool specialist.
pub fn full_registry(shell_timeout: Duration) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ReadFileTool));
    registry.register(Box::new(WriteFileTool));
    registry.register(Box::new(CreateFolderTool));
    registry.register(Box::new(MoveFileTool));
    registry.register(Box::new(CopyFileTool));
    registry.register(Box::new(RenameFileTool));
    registry.register(Box::new(ReadFileRangeTool));
    registry.register(Box::new(GrepTool));
    registry.register(Box::new(ShellTool::new("run_cli_command").with_timeout(shell_timeout)));
    registry
}

/// Pull a required string argument out of a call's arguments.
pub(crate) fn str_arg<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

/// Absolute form of `path` for reporting; falls back to the input as given.
pub(crate) fn display_path(path: &str) -> String {
    std::path::absolute(path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.to_string())
}

//! File write tools: write files and create folders.

use async_trait::async_trait;
use taskforge_core::error::ToolError;
use taskforge_core::tool::{Tool, ToolResult};
use tracing::debug;

use crate::{display_path, str_arg};

/// Write content to a file, creating parent directories as needed.
///
/// The payload reports whether the file was `created` or `modified`.
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file. Creates the file if it doesn't exist, overwrites if it does."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file to write"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write to the file"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = str_arg(&arguments, "file_path")?;
        let content = str_arg(&arguments, "content")?;

        // Ensure parent directory exists
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Ok(ToolResult::failure(format!("Error writing file: {e}")));
        }

        let is_new = !tokio::fs::try_exists(path).await.unwrap_or(false);
        let action = if is_new { "created" } else { "modified" };
        debug!(path = %path, bytes = content.len(), action, "Writing file");

        match tokio::fs::write(path, content).await {
            Ok(()) => Ok(ToolResult::ok(serde_json::json!({
                "path": display_path(path),
                "action": action,
            }))),
            Err(e) => Ok(ToolResult::failure(format!("Error writing file: {e}"))),
        }
    }
}

/// Create a folder and any missing parents.
pub struct CreateFolderTool;

#[async_trait]
impl Tool for CreateFolderTool {
    fn name(&self) -> &str {
        "create_folder"
    }

    fn description(&self) -> &str {
        "Create a folder/directory. Creates parent directories as needed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "folder_path": {
                    "type": "string",
                    "description": "Path to the folder to create"
                }
            },
            "required": ["folder_path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = str_arg(&arguments, "folder_path")?;
        debug!(path = %path, "Creating folder");

        match tokio::fs::create_dir_all(path).await {
            Ok(()) => Ok(ToolResult::ok(serde_json::json!({ "path": display_path(path) }))),
            Err(e) => Ok(ToolResult::failure(format!("Error creating folder: {e}"))),
        }
    }
}

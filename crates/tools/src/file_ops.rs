//! Move, copy and rename tools.
//!
//! When the destination of a move or copy is an existing directory, the
//! source keeps its file name inside that directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use taskforge_core::error::ToolError;
use taskforge_core::tool::{Tool, ToolResult};
use tracing::debug;

use crate::str_arg;

fn transfer_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "source_path": { "type": "string", "description": "Existing file or folder" },
            "destination_path": { "type": "string", "description": "Where it should end up" }
        },
        "required": ["source_path", "destination_path"]
    })
}

async fn resolve_destination(source: &str, destination: &str) -> PathBuf {
    let dest = PathBuf::from(destination);
    if tokio::fs::metadata(&dest).await.is_ok_and(|m| m.is_dir())
        && let Some(name) = Path::new(source).file_name()
    {
        return dest.join(name);
    }
    dest
}

/// Rename `source` to `target`, copying then deleting when they sit on
/// different filesystems.
async fn move_path(source: &Path, target: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(source, target).await {
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            debug!(source = %source.display(), "Rename crosses devices, copying instead");
            copy_then_remove(source.to_path_buf(), target.to_path_buf()).await
        }
        other => other,
    }
}

async fn copy_then_remove(source: PathBuf, target: PathBuf) -> std::io::Result<()> {
    if !tokio::fs::metadata(&source).await?.is_dir() {
        tokio::fs::copy(&source, &target).await?;
        return tokio::fs::remove_file(&source).await;
    }

    let (from, to) = (source.clone(), target);
    tokio::task::spawn_blocking(move || copy_tree(&from, &to))
        .await
        .map_err(std::io::Error::other)??;
    tokio::fs::remove_dir_all(&source).await
}

fn copy_tree(source: &Path, target: &Path) -> std::io::Result<()> {
    for entry in walkdir::WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(std::io::Error::other)?;
        let dest = target.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

pub struct MoveFileTool;

#[async_trait]
impl Tool for MoveFileTool {
    fn name(&self) -> &str {
        "move_file"
    }

    fn description(&self) -> &str {
        "Move a file or folder."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        transfer_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let source = str_arg(&arguments, "source_path")?;
        let destination = str_arg(&arguments, "destination_path")?;
        let target = resolve_destination(source, destination).await;
        debug!(source = %source, target = %target.display(), "Moving");

        match move_path(Path::new(source), &target).await {
            Ok(()) => Ok(ToolResult::ok(format!(
                "Successfully moved {source} to {destination}"
            ))),
            Err(e) => Ok(ToolResult::failure(format!("Error moving {source}: {e}"))),
        }
    }
}

/// Copy a single file. Directories are rejected.
pub struct CopyFileTool;

#[async_trait]
impl Tool for CopyFileTool {
    fn name(&self) -> &str {
        "copy_file"
    }

    fn description(&self) -> &str {
        "Copy a file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        transfer_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let source = str_arg(&arguments, "source_path")?;
        let destination = str_arg(&arguments, "destination_path")?;

        if tokio::fs::metadata(source).await.is_ok_and(|m| m.is_dir()) {
            return Ok(ToolResult::failure(format!(
                "Error copying {source}: source is a directory"
            )));
        }

        let target = resolve_destination(source, destination).await;
        debug!(source = %source, target = %target.display(), "Copying");

        match tokio::fs::copy(source, &target).await {
            Ok(_) => Ok(ToolResult::ok(format!(
                "Successfully copied {source} to {destination}"
            ))),
            Err(e) => Ok(ToolResult::failure(format!("Error copying {source}: {e}"))),
        }
    }
}

pub struct RenameFileTool;

#[async_trait]
impl Tool for RenameFileTool {
    fn name(&self) -> &str {
        "rename_file"
    }

    fn description(&self) -> &str {
        "Rename a file or folder."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "old_path": { "type": "string", "description": "Current path" },
                "new_path": { "type": "string", "description": "New path" }
            },
            "required": ["old_path", "new_path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let old_path = str_arg(&arguments, "old_path")?;
        let new_path = str_arg(&arguments, "new_path")?;
        debug!(from = %old_path, to = %new_path, "Renaming");

        match tokio::fs::rename(old_path, new_path).await {
            Ok(()) => Ok(ToolResult::ok(format!(
                "Successfully renamed {old_path} to {new_path}"
            ))),
            Err(e) => Ok(ToolResult::failure(format!("Error renaming {old_path}: {e}"))),
        }
    }
}

//! File read tools: whole-file and line-range reads.

use async_trait::async_trait;
use taskforge_core::error::ToolError;
use taskforge_core::tool::{Tool, ToolResult};
use tracing::debug;

use crate::{display_path, str_arg};

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file to read"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = str_arg(&arguments, "file_path")?;
        debug!(path = %path, "Reading file");

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(ToolResult::failure(format!("File not found: {path}")));
        }

        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(ToolResult::ok(serde_json::json!({
                "content": content,
                "path": display_path(path),
            }))),
            Err(e) => Ok(ToolResult::failure(format!("Error reading file: {e}"))),
        }
    }
}

/// Read lines `[start, end)` of a file, zero-based. Out-of-range bounds
/// are clamped, so an entirely out-of-range request yields an empty slice.
pub struct ReadFileRangeTool;

#[async_trait]
impl Tool for ReadFileRangeTool {
    fn name(&self) -> &str {
        "read_file_range"
    }

    fn description(&self) -> &str {
        "Read a specific range of lines from a file (zero-based, end exclusive)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": { "type": "string", "description": "Path to the file" },
                "start": { "type": "integer", "description": "First line (zero-based)" },
                "end": { "type": "integer", "description": "Line after the last one to read" }
            },
            "required": ["file_path", "start", "end"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = str_arg(&arguments, "file_path")?;
        let start = line_index(&arguments, "start")?;
        let end = line_index(&arguments, "end")?;

        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) => return Ok(ToolResult::failure(format!("Error reading file: {e}"))),
        };

        Ok(ToolResult::ok(slice_lines(&content, start, end)))
    }
}

fn line_index(arguments: &serde_json::Value, key: &str) -> Result<usize, ToolError> {
    let value = arguments[key]
        .as_i64()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))?;
    Ok(value.max(0) as usize)
}

fn slice_lines(content: &str, start: usize, end: usize) -> String {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let end = end.min(lines.len());
    if start >= end {
        return String::new();
    }
    lines[start..end].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("notes.txt");
        std::fs::write(&file_path, "Hello, world!\n").unwrap();

        let result = ReadFileTool
            .execute(serde_json::json!({ "file_path": file_path.to_str().unwrap() }))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.payload["content"], "Hello, world!\n");
        assert!(result.payload["path"].as_str().unwrap().ends_with("notes.txt"));
    }

    #[tokio::test]
    async fn read_nonexistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let result = ReadFileTool
            .execute(serde_json::json!({ "file_path": missing.to_str().unwrap() }))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.render().starts_with("File not found"));
    }

    #[tokio::test]
    async fn missing_path_argument() {
        let result = ReadFileTool.execute(serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn range_selects_lines() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("lines.txt");
        std::fs::write(&file_path, "zero\none\ntwo\nthree\n").unwrap();

        let result = ReadFileRangeTool
            .execute(serde_json::json!({
                "file_path": file_path.to_str().unwrap(),
                "start": 1,
                "end": 3
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.payload, "one\ntwo\n");
    }

    #[tokio::test]
    async fn range_out_of_bounds_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("short.txt");
        std::fs::write(&file_path, "only\n").unwrap();

        let result = ReadFileRangeTool
            .execute(serde_json::json!({
                "file_path": file_path.to_str().unwrap(),
                "start": 10,
                "end": 20
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.payload, "");
    }

    #[test]
    fn slice_clamps_end() {
        assert_eq!(slice_lines("a\nb", 0, 99), "a\nb");
        assert_eq!(slice_lines("a\nb\n", 2, 1), "");
    }
}

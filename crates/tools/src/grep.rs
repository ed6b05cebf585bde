//! Grep tool: regex search across every file under a directory.

use async_trait::async_trait;
use regex::Regex;
use taskforge_core::error::ToolError;
use taskforge_core::tool::{Tool, ToolResult};
use tracing::debug;
use walkdir::WalkDir;

use crate::str_arg;

/// Recursive regex search. Matches are reported as `path:line:content`,
/// one per line. Files that can't be read are skipped; invalid UTF-8 is
/// replaced rather than rejected.
pub struct GrepTool;

#[async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search for a regex pattern in all files under a directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "directory": { "type": "string", "description": "Directory to search" },
                "pattern": { "type": "string", "description": "Regular expression" }
            },
            "required": ["directory", "pattern"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let directory = str_arg(&arguments, "directory")?.to_string();
        let pattern = str_arg(&arguments, "pattern")?;

        let regex = match Regex::new(pattern) {
            Ok(r) => r,
            Err(e) => return Ok(ToolResult::failure(format!("Invalid pattern: {e}"))),
        };

        let matches = tokio::task::spawn_blocking(move || search(&directory, &regex))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "grep".into(),
                reason: e.to_string(),
            })?;

        debug!(pattern = %pattern, matches = matches.len(), "Grep finished");
        Ok(ToolResult::ok(matches.join("\n")))
    }
}

fn search(directory: &str, regex: &Regex) -> Vec<String> {
    let mut matches = Vec::new();
    for entry in WalkDir::new(directory)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let Ok(bytes) = std::fs::read(entry.path()) else {
            continue;
        };
        let text = String::from_utf8_lossy(&bytes);
        for (i, line) in text.lines().enumerate() {
            if regex.is_match(line) {
                matches.push(format!("{}:{}:{}", entry.path().display(), i + 1, line.trim()));
            }
        }
    }
    matches
}

//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world:
//! execute shell commands, read/write files, search a directory tree.
//! The engine never looks inside a tool; it only sees the result shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A request to execute a tool, as emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON object
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// Tool-specific structured data or text
    #[serde(default)]
    pub payload: serde_json::Value,

    /// Failure description when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// A successful result carrying `payload`.
    pub fn ok(payload: impl Into<serde_json::Value>) -> Self {
        Self {
            success: true,
            payload: payload.into(),
            error: None,
        }
    }

    /// A tagged failure.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }

    /// A failure that still carries partial output (e.g. a non-zero exit code).
    pub fn failure_with(payload: impl Into<serde_json::Value>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: payload.into(),
            error: Some(error.into()),
        }
    }

    /// Text fed back to the model as the observation.
    pub fn render(&self) -> String {
        if !self.success && self.payload.is_null() {
            return self.error.clone().unwrap_or_else(|| "Tool failed".into());
        }
        let body = match &self.payload {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        match (&self.error, self.success) {
            (Some(err), false) => format!("{err}\n{body}"),
            _ => body,
        }
    }
}

/// The core Tool trait.
///
/// Each tool (read_file, write_file, grep, run_command, ...) implements this
/// trait and is registered in the [`ToolRegistry`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// Built once, then shared read-only (behind an `Arc`) by every run.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool definitions for the LLM, sorted by name so requests are stable.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check `arguments` against a JSON Schema object.
///
/// Only the subset tools declare is enforced: the value must be an object,
/// every `required` key must be present, and declared primitive `type`s must
/// match. Unknown keys are allowed.
pub fn validate_arguments(
    schema: &serde_json::Value,
    arguments: &serde_json::Value,
) -> std::result::Result<(), ToolError> {
    let empty = serde_json::Map::new();
    let args = match arguments {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => &empty,
        other => {
            return Err(ToolError::InvalidArguments(format!(
                "expected a JSON object, got {other}"
            )));
        }
    };

    if let Some(required) = schema["required"].as_array() {
        for key in required.iter().filter_map(|k| k.as_str()) {
            if !args.contains_key(key) {
                return Err(ToolError::InvalidArguments(format!(
                    "Missing '{key}' argument"
                )));
            }
        }
    }

    if let Some(properties) = schema["properties"].as_object() {
        for (key, value) in args {
            let Some(expected) = properties.get(key).and_then(|p| p["type"].as_str()) else {
                continue;
            };
            let matches = match expected {
                "string" => value.is_string(),
                "integer" => value.is_i64() || value.is_u64(),
                "number" => value.is_number(),
                "boolean" => value.is_boolean(),
                "object" => value.is_object(),
                "array" => value.is_array(),
                _ => true,
            };
            if !matches {
                return Err(ToolError::InvalidArguments(format!(
                    "'{key}' must be of type {expected}, got {value}"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "times": { "type": "integer" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError> {
            let text = arguments["text"].as_str().unwrap_or("").to_string();
            Ok(ToolResult::ok(text))
        }
    }

    fn echo_call(arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: "echo".into(),
            arguments,
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.names(), vec!["echo"]);
    }

    #[test]
    fn registry_definitions() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }

    #[tokio::test]
    async fn registered_tool_executes_through_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let call = echo_call(serde_json::json!({"text": "hello world"}));
        let tool = registry.get(&call.name).unwrap();
        assert!(validate_arguments(&tool.parameters_schema(), &call.arguments).is_ok());
        let result = tool.execute(call.arguments.clone()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.render(), "hello world");
    }

    #[test]
    fn validation_names_missing_required_argument() {
        let schema = EchoTool.parameters_schema();
        let err = validate_arguments(&schema, &serde_json::json!({"times": 2})).unwrap_err();
        assert!(err.to_string().contains("text"));
    }

    #[test]
    fn validation_checks_declared_types() {
        let schema = EchoTool.parameters_schema();
        assert!(validate_arguments(&schema, &serde_json::json!({"text": "a", "times": 3})).is_ok());
        assert!(validate_arguments(&schema, &serde_json::json!({"text": 5})).is_err());
        assert!(validate_arguments(&schema, &serde_json::json!({"text": "a", "times": "3"})).is_err());
        assert!(validate_arguments(&schema, &serde_json::json!("text")).is_err());
    }

    #[test]
    fn validation_allows_unknown_keys() {
        let schema = EchoTool.parameters_schema();
        assert!(validate_arguments(&schema, &serde_json::json!({"text": "a", "extra": true})).is_ok());
    }

    #[test]
    fn render_prefers_error_text_for_failures() {
        let failed = ToolResult::failure("Unknown tool: teleport");
        assert_eq!(failed.render(), "Unknown tool: teleport");

        let partial = ToolResult::failure_with(serde_json::json!({"exit_code": 1}), "Command failed");
        assert!(partial.render().starts_with("Command failed"));
        assert!(partial.render().contains("exit_code"));
    }

    #[test]
    fn render_structured_payload_as_json() {
        let result = ToolResult::ok(serde_json::json!({"path": "/tmp/x", "action": "created"}));
        let text = result.render();
        assert!(text.contains(r#""action":"created""#));
    }
}

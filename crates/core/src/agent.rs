//! Agent configuration and run outcome types.

use serde::{Deserialize, Serialize};

/// Phrase the model uses to signal that the task is finished.
pub const DEFAULT_COMPLETION_MARKER: &str = "TASK COMPLETE";

/// Configuration for the agent's behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model to use
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temp")]
    pub temperature: f32,

    /// Maximum tokens per model response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Maximum think passes per task (safety limit)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Completion sentinel, matched case-insensitively
    #[serde(default = "default_completion_marker")]
    pub completion_marker: String,
}

fn default_temp() -> f32 {
    0.1
}
fn default_max_iterations() -> u32 {
    15
}
fn default_completion_marker() -> String {
    DEFAULT_COMPLETION_MARKER.into()
}

impl AgentConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: default_temp(),
            max_tokens: None,
            max_iterations: default_max_iterations(),
            completion_marker: default_completion_marker(),
        }
    }
}

/// How a ReAct run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// True when the model emitted the completion marker
    pub success: bool,

    /// Think passes performed
    pub iterations: u32,

    /// The assistant text that contained the marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_message: Option<String>,
}

impl RunOutcome {
    pub fn completed(iterations: u32, final_message: impl Into<String>) -> Self {
        Self {
            success: true,
            iterations,
            final_message: Some(final_message.into()),
        }
    }

    pub fn exhausted(iterations: u32) -> Self {
        Self {
            success: false,
            iterations,
            final_message: None,
        }
    }

    /// Short human-readable summary.
    pub fn summary(&self) -> &'static str {
        if self.success {
            "Task completed successfully"
        } else {
            "Max iterations reached without completion"
        }
    }
}

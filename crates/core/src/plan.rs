//! Plans: ordered lists of delegated steps for the orchestrator.
//!
//! A plan is produced once by a planning call and treated as read-only input
//! afterwards. Planner output is free text; the plan itself is the first
//! fenced ```json block (or the whole reply, if it is bare JSON).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Which specialist handles a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Coder,
    Tool,
    Tester,
    Debugger,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coder => "coder",
            Self::Tool => "tool",
            Self::Tester => "tester",
            Self::Debugger => "debugger",
        }
    }
}

impl std::str::FromStr for AgentKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coder" | "coding_agent" => Ok(Self::Coder),
            "tool" | "tool_agent" => Ok(Self::Tool),
            "tester" | "testing_agent" => Ok(Self::Tester),
            "debugger" | "debugging_agent" => Ok(Self::Debugger),
            other => Err(PlanError::UnknownAgent(other.to_string())),
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One delegated step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub agent: AgentKind,
    pub instruction: String,
}

impl PlanStep {
    pub fn new(agent: AgentKind, instruction: impl Into<String>) -> Self {
        Self {
            agent,
            instruction: instruction.into(),
        }
    }
}

#[derive(Deserialize)]
struct RawStep {
    agent: String,
    instruction: String,
}

/// An ordered, non-empty list of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Result<Self, PlanError> {
        if steps.is_empty() {
            return Err(PlanError::Empty);
        }
        Ok(Self { steps })
    }

    /// Parse a JSON array of `{agent, instruction}` objects.
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        let raw: Vec<RawStep> =
            serde_json::from_str(json).map_err(|e| PlanError::InvalidJson(e.to_string()))?;
        let steps = raw
            .into_iter()
            .map(|s| Ok(PlanStep::new(s.agent.parse()?, s.instruction)))
            .collect::<Result<Vec<_>, PlanError>>()?;
        Self::new(steps)
    }

    /// Extract and parse the plan from a planner reply.
    pub fn from_planner_output(text: &str) -> Result<Self, PlanError> {
        if let Some(block) = extract_json_block(text) {
            return Self::from_json(block);
        }
        let trimmed = text.trim();
        if trimmed.starts_with('[') {
            return Self::from_json(trimmed);
        }
        Err(PlanError::MissingJson(preview(trimmed)))
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&PlanStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Body of the first ```json fenced block, if any. The fence must open a
/// line and be followed by a newline; inline mentions are prose.
fn extract_json_block(text: &str) -> Option<&str> {
    static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^[ \t]*```json[ \t]*\r?\n([\s\S]*?)\r?\n[ \t]*```")
            .expect("invalid json fence regex")
    });
    JSON_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}

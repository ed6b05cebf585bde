//! Sensitivity gate: holds back batches that touch the filesystem or
//! the shell until someone approves them.

use std::collections::HashSet;

use taskforge_core::tool::ToolCall;

/// Tools whose calls need approval before they run.
pub const SENSITIVE_TOOLS: [&str; 7] = [
    "write_file",
    "create_folder",
    "move_file",
    "copy_file",
    "rename_file",
    "run_cli_command",
    "run_command",
];

pub fn is_sensitive(tool_name: &str) -> bool {
    SENSITIVE_TOOLS.contains(&tool_name)
}

/// Outcome of classifying a batch.
#[derive(Debug)]
pub enum GateDecision {
    /// Nothing sensitive; run the batch as is
    Clear(Vec<ToolCall>),
    /// At least one sensitive call; wait for approval
    Suspend(PendingApproval),
}

/// A batch held back for approval.
///
/// Consumed by [`PendingApproval::resolve`]; the calls either all run in
/// their original order or none of them do.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingApproval {
    batch: Vec<ToolCall>,
    sensitive: Vec<bool>,
}

impl PendingApproval {
    /// The calls that triggered the suspension, in batch order.
    pub fn sensitive(&self) -> Vec<&ToolCall> {
        self.partition_by(true)
    }

    /// The calls that would have run unattended, in batch order.
    pub fn non_sensitive(&self) -> Vec<&ToolCall> {
        self.partition_by(false)
    }

    /// The whole batch in its original order.
    pub fn batch(&self) -> &[ToolCall] {
        &self.batch
    }

    /// Approved: the full batch to execute. Denied: nothing.
    pub fn resolve(self, approved: bool) -> Vec<ToolCall> {
        if approved { self.batch } else { Vec::new() }
    }

    fn partition_by(&self, sensitive: bool) -> Vec<&ToolCall> {
        self.batch
            .iter()
            .zip(&self.sensitive)
            .filter(|(_, s)| **s == sensitive)
            .map(|(call, _)| call)
            .collect()
    }
}

/// Partitions tool-call batches by name against a sensitive set.
#[derive(Debug, Clone)]
pub struct SensitivityGate {
    sensitive: HashSet<String>,
}

impl SensitivityGate {
    pub fn new() -> Self {
        Self::with_tools(SENSITIVE_TOOLS)
    }

    /// A gate over a custom sensitive set.
    pub fn with_tools<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sensitive: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_sensitive(&self, tool_name: &str) -> bool {
        self.sensitive.contains(tool_name)
    }

    /// Split a batch into `(sensitive, non_sensitive)`, order preserved.
    pub fn partition(&self, batch: &[ToolCall]) -> (Vec<ToolCall>, Vec<ToolCall>) {
        batch
            .iter()
            .cloned()
            .partition(|call| self.is_sensitive(&call.name))
    }

    pub fn classify(&self, batch: Vec<ToolCall>) -> GateDecision {
        let sensitive: Vec<bool> = batch.iter().map(|c| self.is_sensitive(&c.name)).collect();
        if sensitive.iter().any(|s| *s) {
            GateDecision::Suspend(PendingApproval { batch, sensitive })
        } else {
            GateDecision::Clear(batch)
        }
    }
}

impl Default for SensitivityGate {
    fn default() -> Self {
        Self::new()
    }
}

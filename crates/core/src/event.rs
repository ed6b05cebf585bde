//! Step events: what the engine reports while it works.
//!
//! Presentation layers (the terminal renderer, tests) subscribe by holding
//! the receiving end of an [`EventSink`]. Nothing flows back through this
//! channel; approvals travel through a separate interface.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Phase of the think → act → observe cycle an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPhase {
    Think,
    Act,
    Observe,
    Complete,
}

impl StepPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Think => "think",
            Self::Act => "act",
            Self::Observe => "observe",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for StepPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observable step of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    pub phase: StepPhase,

    /// 1-based iteration (ReAct) or plan position (orchestrator)
    pub iteration: u32,

    /// Human-readable description
    pub content: String,

    /// Structured details (tool name, arguments, result, ...)
    #[serde(default)]
    pub data: serde_json::Value,
}

impl StepEvent {
    pub fn new(
        phase: StepPhase,
        iteration: u32,
        content: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            phase,
            iteration,
            content: content.into(),
            data,
        }
    }
}

/// Sending side of the step-event channel.
///
/// Events are delivered in emission order. A sink without a receiver, or
/// whose receiver was dropped, silently discards events.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<mpsc::UnboundedSender<StepEvent>>,
}

impl EventSink {
    /// Create a sink and the receiver that observes it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StepEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// A sink that drops everything.
    pub fn noop() -> Self {
        Self { sender: None }
    }

    pub fn emit(&self, event: StepEvent) {
        if let Some(tx) = &self.sender {
            // Ignore send errors (no subscriber = that's fine)
            let _ = tx.send(event);
        }
    }

    /// Shorthand for `emit(StepEvent::new(..))`.
    pub fn step(
        &self,
        phase: StepPhase,
        iteration: u32,
        content: impl Into<String>,
        data: serde_json::Value,
    ) {
        self.emit(StepEvent::new(phase, iteration, content, data));
    }
}

//! Failure-isolating tool dispatch.
//!
//! Every tool call produces exactly one [`Observation`]. Unknown tools,
//! schema violations, tool errors and panics all become failure results;
//! none of them escape to the caller.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use taskforge_core::message::Message;
use taskforge_core::tool::{ToolCall, ToolRegistry, ToolResult, validate_arguments};
use tracing::{debug, warn};

/// The outcome of one dispatched call.
#[derive(Debug, Clone)]
pub struct Observation {
    pub call: ToolCall,
    pub result: ToolResult,

    /// Set when the tool never produced a result of its own: unknown name,
    /// invalid arguments, a returned error, or a panic.
    pub fault: Option<String>,
}

impl Observation {
    fn fault(call: &ToolCall, message: String) -> Self {
        Self {
            call: call.clone(),
            result: ToolResult::failure(message.clone()),
            fault: Some(message),
        }
    }

    /// Text for the Observe step event.
    pub fn summary(&self) -> String {
        match &self.fault {
            Some(message) => message.clone(),
            None => format!("Result from {}", self.call.name),
        }
    }

    /// Structured data for the Observe step event.
    pub fn event_data(&self) -> serde_json::Value {
        match &self.fault {
            Some(message) => serde_json::json!({ "tool": self.call.name, "error": message }),
            None => serde_json::json!({
                "tool": self.call.name,
                "success": self.result.success,
                "result": self.result.payload,
                "error": self.result.error,
            }),
        }
    }

    /// The Tool message that answers this call in the transcript.
    pub fn to_message(&self) -> Message {
        Message::tool_result(&self.call.id, self.result.render())
    }
}

/// Dispatch one call against the registry.
pub async fn dispatch(registry: &ToolRegistry, call: &ToolCall) -> Observation {
    let Some(tool) = registry.get(&call.name) else {
        warn!(tool = %call.name, "Unknown tool requested");
        return Observation::fault(call, format!("Unknown tool: {}", call.name));
    };

    if let Err(e) = validate_arguments(&tool.parameters_schema(), &call.arguments) {
        return Observation::fault(call, format!("Error executing {}: {e}", call.name));
    }

    debug!(tool = %call.name, call_id = %call.id, "Dispatching tool call");
    let started = std::time::Instant::now();
    let outcome = AssertUnwindSafe(tool.execute(call.arguments.clone()))
        .catch_unwind()
        .await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(result)) => {
            debug!(tool = %call.name, success = result.success, duration_ms, "Tool finished");
            Observation {
                call: call.clone(),
                result,
                fault: None,
            }
        }
        Ok(Err(e)) => {
            warn!(tool = %call.name, error = %e, "Tool returned an error");
            Observation::fault(call, format!("Error executing {}: {e}", call.name))
        }
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            warn!(tool = %call.name, reason = %reason, "Tool panicked");
            Observation::fault(call, format!("Error executing {}: {reason}", call.name))
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".into()
    }
}

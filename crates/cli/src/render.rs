//! Terminal rendering of step events and outcomes.

use serde_json::Value;
use taskforge_agent::OrchestrationOutcome;
use taskforge_core::agent::RunOutcome;
use taskforge_core::event::{StepEvent, StepPhase};
use taskforge_core::plan::Plan;

const PREVIEW_CHARS: usize = 400;

pub fn event(event: &StepEvent) {
    match event.phase {
        StepPhase::Think => {
            // The approver prints its own prompt for these
            if event.data["needs_confirmation"] == true {
                return;
            }
            block("think", &event.content);
        }
        StepPhase::Act => {
            let args = event.data.get("args").map(compact).unwrap_or_default();
            println!("  [act] {} {}", event.content, args);
        }
        StepPhase::Observe => {
            block("observe", &event.content);
            if let Some(result) = event.data.get("result")
                && !result.is_null()
            {
                for line in preview(result).lines() {
                    println!("          {line}");
                }
            }
        }
        StepPhase::Complete => block("done", &event.content),
    }
}

pub fn outcome(outcome: &RunOutcome) {
    println!();
    println!("  {} ({} iterations)", outcome.summary(), outcome.iterations);
}

pub fn orchestration(outcome: &OrchestrationOutcome) {
    println!();
    println!("  Plan finished ({} steps)", outcome.steps);
    if outcome.denied_batches > 0 {
        println!("  Denied tool batches: {}", outcome.denied_batches);
    }
    if let Some(last) = &outcome.last_response {
        println!();
        for line in last.lines() {
            println!("  {line}");
        }
    }
}

pub fn plan(plan: &Plan) {
    println!("  Plan:");
    for (i, step) in plan.steps().iter().enumerate() {
        println!("    {}. [{}] {}", i + 1, step.agent, step.instruction);
    }
    println!();
}

fn block(tag: &str, text: &str) {
    let mut lines = text.lines();
    println!("  [{tag}] {}", lines.next().unwrap_or_default());
    for line in lines {
        println!("          {line}");
    }
}

fn compact(value: &Value) -> String {
    truncate(&value.to_string())
}

fn preview(value: &Value) -> String {
    match value {
        Value::String(s) => truncate(s),
        Value::Object(map) => {
            // Shell results read better as their streams
            let mut out = String::new();
            for key in ["stdout", "stderr"] {
                if let Some(text) = map.get(key).and_then(Value::as_str)
                    && !text.trim().is_empty()
                {
                    out.push_str(text.trim_end());
                    out.push('\n');
                }
            }
            if out.is_empty() {
                compact(value)
            } else {
                truncate(&out)
            }
        }
        other => compact(other),
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

//! ReAct engine - Think → Act → Observe loop.
//!
//! The engine seeds a conversation with a system prompt and the task,
//! then repeatedly asks the model for its next move:
//!
//! - **Think**: one model exchange with every registered tool bound
//! - **Act**: each requested tool call runs in order, isolated from failure
//! - **Observe**: results go back into the transcript, one per call
//!
//! The loop terminates when the model's text contains the completion
//! marker, or when the iteration budget runs out.

use std::sync::Arc;

use serde_json::json;
use taskforge_core::agent::{AgentConfig, RunOutcome};
use taskforge_core::error::{Error, Result};
use taskforge_core::event::{EventSink, StepEvent, StepPhase};
use taskforge_core::message::{Conversation, Message};
use taskforge_core::provider::{Provider, ProviderRequest};
use taskforge_core::tool::{ToolCall, ToolRegistry};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::dispatch;
use crate::prompts;

/// What the engine does with one assistant message.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// No marker and no calls: think again
    Continue,
    /// Run these calls, in order
    ActOn(Vec<ToolCall>),
    /// The marker was found; carries the assistant text
    Done(String),
}

/// Classify an assistant message.
///
/// The marker is matched case-insensitively anywhere in the text and wins
/// over tool calls; calls in a completing message are dropped.
pub fn classify(message: &Message, completion_marker: &str) -> Decision {
    let text = message.content();
    if text
        .to_uppercase()
        .contains(&completion_marker.to_uppercase())
    {
        return Decision::Done(text.to_string());
    }
    match message.tool_calls() {
        [] => Decision::Continue,
        calls => Decision::ActOn(calls.to_vec()),
    }
}

/// Single-agent step loop over a tool registry.
#[derive(Clone)]
pub struct ReactEngine {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
    system_prompt: String,
    events: EventSink,
    cancel: CancellationToken,
}

impl ReactEngine {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        let system_prompt = prompts::react(&config.completion_marker);
        Self {
            provider,
            tools,
            config,
            system_prompt,
            events: EventSink::noop(),
            cancel: CancellationToken::new(),
        }
    }

    /// Report step events to `sink`.
    pub fn with_events(mut self, sink: EventSink) -> Self {
        self.events = sink;
        self
    }

    /// Stop at the next iteration boundary once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run a task on a fresh conversation.
    pub async fn run(&self, task: &str) -> Result<RunOutcome> {
        let mut conversation = Conversation::seeded(&self.system_prompt, format!("Task: {task}"));
        self.run_in(&mut conversation).await
    }

    /// Run the task on a background task, streaming its step events.
    pub fn run_stream(
        &self,
        task: &str,
    ) -> (JoinHandle<Result<RunOutcome>>, mpsc::UnboundedReceiver<StepEvent>) {
        let (sink, rx) = EventSink::channel();
        let engine = self.clone().with_events(sink);
        let task = task.to_string();
        let handle = tokio::spawn(async move { engine.run(&task).await });
        (handle, rx)
    }

    /// Drive the loop over an already seeded conversation.
    pub async fn run_in(&self, conversation: &mut Conversation) -> Result<RunOutcome> {
        let tool_defs = self.tools.definitions();
        let max = self.config.max_iterations;

        info!(
            conversation = %conversation.id,
            model = %self.config.model,
            max_iterations = max,
            tools = tool_defs.len(),
            "ReAct loop starting"
        );

        for iteration in 1..=max {
            if self.cancel.is_cancelled() {
                info!(iteration, "ReAct loop cancelled");
                return Err(Error::Cancelled);
            }

            // ── Think ──
            self.events.step(
                StepPhase::Think,
                iteration,
                format!("Iteration {iteration}"),
                json!({ "iteration": iteration }),
            );

            let request = ProviderRequest {
                model: self.config.model.clone(),
                messages: conversation.messages().to_vec(),
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
                tools: tool_defs.clone(),
            };

            let response = tokio::select! {
                response = self.provider.complete(request) => response?,
                _ = self.cancel.cancelled() => {
                    info!(iteration, "ReAct loop cancelled during model call");
                    return Err(Error::Cancelled);
                }
            };

            let message = response.message;
            let text = message.content().to_string();
            if !text.trim().is_empty() {
                self.events.step(
                    StepPhase::Think,
                    iteration,
                    text.clone(),
                    json!({ "iteration": iteration, "has_content": true }),
                );
            }

            let planned: Vec<&str> = message.tool_calls().iter().map(|c| c.name.as_str()).collect();
            if !planned.is_empty() {
                self.events.step(
                    StepPhase::Think,
                    iteration,
                    format!("Planning to use tools: {}", planned.join(", ")),
                    json!({ "iteration": iteration, "planned_tools": planned }),
                );
            }

            match classify(&message, &self.config.completion_marker) {
                Decision::Done(text) => {
                    if !message.tool_calls().is_empty() {
                        debug!(
                            dropped = message.tool_calls().len(),
                            "Completion marker present, dropping tool calls"
                        );
                    }
                    conversation.push(Message::assistant(&text));
                    self.events.step(
                        StepPhase::Complete,
                        iteration,
                        text.clone(),
                        json!({ "iteration": iteration }),
                    );
                    info!(iterations = iteration, "ReAct loop completed");
                    return Ok(RunOutcome::completed(iteration, text));
                }
                Decision::ActOn(calls) => {
                    conversation.push(message);
                    self.act(iteration, &calls, conversation).await;
                }
                Decision::Continue => {
                    conversation.push(message);
                    self.events.step(
                        StepPhase::Think,
                        iteration,
                        "No action taken, continuing...",
                        json!({ "iteration": iteration }),
                    );
                }
            }
        }

        warn!(max_iterations = max, "ReAct: max iterations reached");
        Ok(RunOutcome::exhausted(max))
    }

    /// Act and observe: one Tool message per call, in order.
    async fn act(&self, iteration: u32, calls: &[ToolCall], conversation: &mut Conversation) {
        for call in calls {
            self.events.step(
                StepPhase::Act,
                iteration,
                format!("Using {}", call.name),
                json!({ "tool": call.name, "args": call.arguments }),
            );

            let observation = dispatch(&self.tools, call).await;
            conversation.push(observation.to_message());

            self.events.step(
                StepPhase::Observe,
                iteration,
                observation.summary(),
                observation.event_data(),
            );
        }
        debug_assert!(conversation.unresolved_calls().is_empty());
    }
}

//! Plan-driven orchestrator: walks a plan step by step, delegating each
//! step to a specialist.
//!
//! ```text
//!            ┌──────────── Continue ────────────┐
//!            ▼                                  │
//!   plan ─► Step ─► coder ─┬─► (next is tester) ─► Tester ─┬─ FAIL ─► Debugger
//!                          │                               │
//!                   tool ─► gate ─► approve? ─► execute    └─ otherwise ─► Continue / End
//! ```
//!
//! Routing after every node is the pure function [`route`]. The only point
//! where the orchestrator stops and waits is the sensitivity gate:
//! [`Orchestrator::advance`] returns [`Advance::Suspended`] and the caller
//! answers with [`Orchestrator::resume`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use taskforge_core::error::{Error, Result};
use taskforge_core::event::{EventSink, StepPhase};
use taskforge_core::plan::{AgentKind, Plan, PlanStep};
use taskforge_core::tool::{ToolCall, ToolRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::dispatch;
use crate::gate::{GateDecision, PendingApproval, SensitivityGate};
use crate::specialist::SpecialistTeam;

/// Substring of tester output that marks a failed test run.
pub const FAILURE_SENTINEL: &str = "FAIL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    NotRun,
    Passed,
    Failed,
}

impl TestOutcome {
    pub fn from_output(output: &str) -> Self {
        if output.contains(FAILURE_SENTINEL) {
            Self::Failed
        } else {
            Self::Passed
        }
    }
}

/// Where control goes after a node finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Test the coder's output with the next (tester) step
    Tester,
    /// Analyze the failing test output
    Debugger,
    /// Execute the step at the cursor
    Continue,
    End,
}

/// Routing table keyed by `(current agent, next agent, test outcome)`.
pub fn route(current: AgentKind, next: Option<AgentKind>, outcome: TestOutcome) -> Route {
    match (current, next, outcome) {
        (AgentKind::Coder, Some(AgentKind::Tester), _) => Route::Tester,
        (AgentKind::Tester, _, TestOutcome::Failed) => Route::Debugger,
        (_, Some(_), _) => Route::Continue,
        (_, None, _) => Route::End,
    }
}

/// Result of one [`Orchestrator::advance`] call.
#[derive(Debug)]
pub enum Advance {
    /// More work remains; call `advance` again
    Continue,
    /// A tool batch is waiting for approval; call `resume`
    Suspended(PendingApproval),
    Finished(OrchestrationOutcome),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationOutcome {
    /// Plan length
    pub steps: usize,

    /// Output of the last node that produced one
    pub last_response: Option<String>,

    /// Most recent tester output
    pub test_results: Option<String>,

    /// Most recent debugger output
    pub debug_info: Option<String>,

    /// Tool batches the approver turned down
    pub denied_batches: usize,
}

/// Decides whether a suspended batch may run.
#[async_trait]
pub trait Approver: Send + Sync {
    async fn approve(&self, pending: &PendingApproval) -> bool;
}

/// Answers every request the same way.
pub struct FixedApprover(pub bool);

#[async_trait]
impl Approver for FixedApprover {
    async fn approve(&self, _pending: &PendingApproval) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Step,
    Tester,
    Debugger,
    End,
}

pub struct Orchestrator {
    team: SpecialistTeam,
    tools: Arc<ToolRegistry>,
    gate: SensitivityGate,
    plan: Plan,
    request: String,
    cursor: usize,
    next: Node,
    awaiting_approval: bool,
    last_response: Option<String>,
    test_results: Option<String>,
    /// True once the current `test_results` have been through the debugger
    failure_debugged: bool,
    debug_info: Option<String>,
    denied_batches: usize,
    events: EventSink,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        plan: Plan,
        request: impl Into<String>,
        team: SpecialistTeam,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            team,
            tools,
            gate: SensitivityGate::new(),
            plan,
            request: request.into(),
            cursor: 0,
            next: Node::Step,
            awaiting_approval: false,
            last_response: None,
            test_results: None,
            failure_debugged: false,
            debug_info: None,
            denied_batches: 0,
            events: EventSink::noop(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_events(mut self, sink: EventSink) -> Self {
        self.events = sink;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_gate(mut self, gate: SensitivityGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Index of the next plan step.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn is_awaiting_approval(&self) -> bool {
        self.awaiting_approval
    }

    /// Drive the plan to the end, asking `approver` at every suspension.
    pub async fn run(&mut self, approver: &dyn Approver) -> Result<OrchestrationOutcome> {
        info!(steps = self.plan.len(), "Orchestrator starting");
        let mut state = self.advance().await?;
        loop {
            state = match state {
                Advance::Continue => self.advance().await?,
                Advance::Suspended(pending) => {
                    let approved = approver.approve(&pending).await;
                    info!(approved, calls = pending.batch().len(), "Approval decision");
                    self.resume(pending, approved).await?
                }
                Advance::Finished(outcome) => return Ok(outcome),
            };
        }
    }

    /// Execute one node and route to the next.
    pub async fn advance(&mut self) -> Result<Advance> {
        if self.awaiting_approval {
            return Err(Error::Internal(
                "a tool batch is awaiting approval; call resume first".into(),
            ));
        }
        if self.cancel.is_cancelled() {
            info!(cursor = self.cursor, "Orchestrator cancelled");
            return Err(Error::Cancelled);
        }

        match self.next {
            Node::End => Ok(Advance::Finished(self.outcome())),
            Node::Tester => {
                self.run_tester().await?;
                Ok(self.after(AgentKind::Tester))
            }
            Node::Debugger => {
                self.run_debugger().await?;
                Ok(self.after(AgentKind::Debugger))
            }
            Node::Step => {
                let Some(step) = self.plan.get(self.cursor).cloned() else {
                    self.next = Node::End;
                    return Ok(Advance::Finished(self.outcome()));
                };
                self.events.step(
                    StepPhase::Think,
                    self.position(),
                    format!(
                        "Step {}/{}: {} - {}",
                        self.position(),
                        self.plan.len(),
                        step.agent,
                        step.instruction
                    ),
                    json!({ "step": self.cursor, "agent": step.agent, "instruction": step.instruction }),
                );

                match step.agent {
                    AgentKind::Coder => {
                        self.run_coder(&step).await?;
                        Ok(self.after(AgentKind::Coder))
                    }
                    AgentKind::Tester => {
                        self.run_tester().await?;
                        Ok(self.after(AgentKind::Tester))
                    }
                    AgentKind::Debugger => {
                        self.run_debugger_step(&step).await?;
                        Ok(self.after(AgentKind::Debugger))
                    }
                    AgentKind::Tool => match self.run_tool(&step).await? {
                        Some(pending) => {
                            self.awaiting_approval = true;
                            Ok(Advance::Suspended(pending))
                        }
                        None => Ok(self.after(AgentKind::Tool)),
                    },
                }
            }
        }
    }

    /// Answer a suspension. Approved: the whole batch runs in order.
    /// Denied: nothing runs and the cursor moves past the tool step.
    pub async fn resume(&mut self, pending: PendingApproval, approved: bool) -> Result<Advance> {
        if !self.awaiting_approval {
            return Err(Error::Internal("no tool batch is awaiting approval".into()));
        }
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.awaiting_approval = false;

        let count = pending.batch().len();
        let batch = pending.resolve(approved);
        if approved {
            self.execute_batch(batch).await;
        } else {
            warn!(calls = count, cursor = self.cursor, "Tool batch denied");
            self.events.step(
                StepPhase::Observe,
                self.position(),
                format!("Denied: skipped {count} tool call(s)"),
                json!({ "denied": true, "calls": count }),
            );
            self.denied_batches += 1;
            self.cursor += 1;
        }
        Ok(self.after(AgentKind::Tool))
    }

    async fn run_coder(&mut self, step: &PlanStep) -> Result<()> {
        let reply = self.team.coder.invoke(&step.instruction).await?;
        let output = reply.content().to_string();
        self.emit_output("coder", &output);
        self.last_response = Some(output);
        self.cursor += 1;
        Ok(())
    }

    /// Run the tester step at the cursor. The previous output is attached
    /// only when the instruction asks to test or verify.
    async fn run_tester(&mut self) -> Result<()> {
        let instruction = self
            .plan
            .get(self.cursor)
            .map(|s| s.instruction.clone())
            .unwrap_or_default();

        let mut input = instruction.clone();
        if let Some(last) = &self.last_response {
            let lower = instruction.to_lowercase();
            if lower.contains("test") || lower.contains("verify") {
                input.push_str("\nCode to test: ");
                input.push_str(last);
            }
        }

        let reply = self.team.tester.invoke(&input).await?;
        let output = reply.content().to_string();
        debug!(outcome = ?TestOutcome::from_output(&output), "Tester finished");
        self.emit_output("tester", &output);
        self.test_results = Some(output.clone());
        self.failure_debugged = false;
        self.last_response = Some(output);
        self.cursor += 1;
        Ok(())
    }

    /// Debugger reached by routing after a failed test. Leaves the cursor
    /// where it is.
    async fn run_debugger(&mut self) -> Result<()> {
        let input = format!(
            "Test results:\n{}\nOriginal request: {}",
            self.test_results.as_deref().unwrap_or_default(),
            self.request
        );
        self.events.step(
            StepPhase::Think,
            self.position(),
            "Tests failed, delegating to debugger",
            json!({ "agent": "debugger" }),
        );
        let reply = self.team.debugger.invoke(&input).await?;
        let output = reply.content().to_string();
        self.emit_output("debugger", &output);
        self.debug_info = Some(output.clone());
        self.last_response = Some(output);
        self.failure_debugged = true;
        Ok(())
    }

    /// Debugger as a plan step: runs only against a failing test output
    /// that hasn't been debugged yet.
    async fn run_debugger_step(&mut self, step: &PlanStep) -> Result<()> {
        let failing = self
            .test_results
            .as_deref()
            .is_some_and(|r| TestOutcome::from_output(r) == TestOutcome::Failed);

        if failing && !self.failure_debugged {
            let input = format!(
                "{}\nTest results:\n{}\nOriginal request: {}",
                step.instruction,
                self.test_results.as_deref().unwrap_or_default(),
                self.request
            );
            let reply = self.team.debugger.invoke(&input).await?;
            let output = reply.content().to_string();
            self.emit_output("debugger", &output);
            self.debug_info = Some(output.clone());
            self.last_response = Some(output);
            self.failure_debugged = true;
        } else {
            debug!(cursor = self.cursor, "No failing tests, skipping debugger step");
            self.events.step(
                StepPhase::Observe,
                self.position(),
                "No failing tests, debugger skipped",
                json!({ "agent": "debugger", "skipped": true }),
            );
        }
        self.cursor += 1;
        Ok(())
    }

    /// Returns the batch when it needs approval; otherwise the step is done.
    async fn run_tool(&mut self, step: &PlanStep) -> Result<Option<PendingApproval>> {
        let mut input = step.instruction.clone();
        if step.instruction.to_lowercase().contains("write")
            && let Some(last) = &self.last_response
        {
            input.push_str("\nContent: ");
            input.push_str(last);
        }

        let reply = self.team.tool.invoke(&input).await?;
        let calls = reply.tool_calls().to_vec();

        if calls.is_empty() {
            let output = reply.content().to_string();
            self.emit_output("tool", &output);
            self.last_response = Some(output);
            self.cursor += 1;
            return Ok(None);
        }

        match self.gate.classify(calls) {
            GateDecision::Clear(batch) => {
                self.execute_batch(batch).await;
                Ok(None)
            }
            GateDecision::Suspend(pending) => {
                let sensitive: Vec<_> = pending
                    .sensitive()
                    .iter()
                    .map(|c| json!({ "tool": c.name, "args": c.arguments }))
                    .collect();
                let names: Vec<_> = pending.sensitive().iter().map(|c| c.name.clone()).collect();
                info!(cursor = self.cursor, tools = ?names, "Sensitive tool calls need confirmation");
                self.events.step(
                    StepPhase::Think,
                    self.position(),
                    format!("Awaiting approval for: {}", names.join(", ")),
                    json!({ "needs_confirmation": true, "calls": sensitive }),
                );
                Ok(Some(pending))
            }
        }
    }

    async fn execute_batch(&mut self, batch: Vec<ToolCall>) {
        let position = self.position();
        let mut rendered = Vec::with_capacity(batch.len());
        for call in &batch {
            self.events.step(
                StepPhase::Act,
                position,
                format!("Using {}", call.name),
                json!({ "tool": call.name, "args": call.arguments }),
            );

            let obs = dispatch(&self.tools, call).await;
            self.events
                .step(StepPhase::Observe, position, obs.summary(), obs.event_data());
            rendered.push(obs.result.render());
        }

        self.last_response = Some(rendered.join("\n"));
        self.cursor += 1;
    }

    /// Apply the routing table after `current` finished.
    fn after(&mut self, current: AgentKind) -> Advance {
        let outcome = match (current, &self.test_results) {
            (AgentKind::Tester, Some(results)) => TestOutcome::from_output(results),
            _ => TestOutcome::NotRun,
        };
        let next_agent = self.plan.get(self.cursor).map(|s| s.agent);
        let route = route(current, next_agent, outcome);
        debug!(?current, ?next_agent, ?outcome, ?route, cursor = self.cursor, "Routing");

        self.next = match route {
            Route::Tester => Node::Tester,
            Route::Debugger => Node::Debugger,
            Route::Continue => Node::Step,
            Route::End => Node::End,
        };

        if self.next == Node::End {
            let outcome = self.outcome();
            self.events.step(
                StepPhase::Complete,
                self.position(),
                "Plan finished",
                serde_json::to_value(&outcome).unwrap_or_default(),
            );
            info!(steps = outcome.steps, denied = outcome.denied_batches, "Orchestrator finished");
            Advance::Finished(outcome)
        } else {
            Advance::Continue
        }
    }

    fn emit_output(&self, agent: &str, output: &str) {
        self.events.step(
            StepPhase::Observe,
            self.position(),
            output,
            json!({ "agent": agent }),
        );
    }

    /// 1-based plan position for step events.
    fn position(&self) -> u32 {
        (self.cursor.min(self.plan.len().saturating_sub(1)) + 1) as u32
    }

    fn outcome(&self) -> OrchestrationOutcome {
        OrchestrationOutcome {
            steps: self.plan.len(),
            last_response: self.last_response.clone(),
            test_results: self.test_results.clone(),
            debug_info: self.debug_info.clone(),
            denied_batches: self.denied_batches,
        }
    }
}

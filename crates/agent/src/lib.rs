//! The agent layer of TaskForge.
//!
//! Two ways to drive a task to completion:
//!
//! - [`ReactEngine`]: a single **Think → Act → Observe** loop. The model
//!   reasons, requests tools, sees their results and repeats until it
//!   declares completion or runs out of iterations.
//! - [`Orchestrator`]: a planner splits the request into steps, each step
//!   goes to a specialist (coder, tester, debugger, tool executor), and
//!   sensitive tool batches wait for approval.

pub mod dispatch;
pub mod gate;
pub mod orchestrator;
pub mod prompts;
pub mod react;
pub mod specialist;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use dispatch::{Observation, dispatch};
pub use gate::{GateDecision, PendingApproval, SENSITIVE_TOOLS, SensitivityGate, is_sensitive};
pub use orchestrator::{
    Advance, Approver, FixedApprover, OrchestrationOutcome, Orchestrator, Route, TestOutcome,
    route,
};
pub use react::{Decision, ReactEngine, classify};
pub use specialist::{Role, Specialist, SpecialistTeam};

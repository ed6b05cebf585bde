//! # TaskForge Core
//!
//! Domain types, traits, and error definitions for the TaskForge agent
//! engine. This crate has **no framework dependencies**: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the engine (model gateway, tools, event consumers)
//! is defined as a trait or plain type here. Implementations live in their
//! respective crates, so the engine can be driven by scripted providers in
//! tests and by real HTTP backends in the CLI.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod agent;
pub mod event;
pub mod plan;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role, Conversation, ConversationId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use tool::{Tool, ToolCall, ToolResult, ToolRegistry};
pub use agent::{AgentConfig, RunOutcome};
pub use event::{EventSink, StepEvent, StepPhase};
pub use plan::{AgentKind, Plan, PlanStep};

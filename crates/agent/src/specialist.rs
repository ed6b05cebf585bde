//! Specialists: single-exchange role agents used by the orchestrator.
//!
//! A specialist is a provider, a model, and a role prompt. Each invocation
//! sends `[system prompt, input]` and returns the one assistant message
//! that comes back; there is no loop.

use std::sync::Arc;

use taskforge_core::agent::AgentConfig;
use taskforge_core::error::Result;
use taskforge_core::message::Message;
use taskforge_core::plan::Plan;
use taskforge_core::provider::{Provider, ProviderRequest, ToolDefinition};
use tracing::{debug, info};

use crate::prompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Planner,
    Coder,
    Tester,
    Debugger,
    ToolExecutor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Coder => "coder",
            Self::Tester => "tester",
            Self::Debugger => "debugger",
            Self::ToolExecutor => "tool",
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            Self::Planner => prompts::PLANNER,
            Self::Coder => prompts::CODER,
            Self::Tester => prompts::TESTER,
            Self::Debugger => prompts::DEBUGGER,
            Self::ToolExecutor => prompts::TOOL_EXECUTOR,
        }
    }
}

pub struct Specialist {
    role: Role,
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: String,
    tools: Vec<ToolDefinition>,
}

impl Specialist {
    pub fn new(role: Role, provider: Arc<dyn Provider>, config: &AgentConfig) -> Self {
        Self {
            role,
            provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: role.system_prompt().to_string(),
            tools: Vec::new(),
        }
    }

    /// Bind tool definitions to every request.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// One request/response exchange.
    pub async fn invoke(&self, input: &str) -> Result<Message> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(&self.system_prompt), Message::user(input)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.clone(),
        };

        debug!(role = self.role.as_str(), input_len = input.len(), "Invoking specialist");
        let response = self.provider.complete(request).await?;
        Ok(response.message)
    }
}

/// The five roles, sharing one provider.
pub struct SpecialistTeam {
    pub planner: Specialist,
    pub coder: Specialist,
    pub tester: Specialist,
    pub debugger: Specialist,
    pub tool: Specialist,
}

impl SpecialistTeam {
    /// `tools` are bound to the tool executor only.
    pub fn new(provider: Arc<dyn Provider>, config: &AgentConfig, tools: Vec<ToolDefinition>) -> Self {
        Self {
            planner: Specialist::new(Role::Planner, provider.clone(), config),
            coder: Specialist::new(Role::Coder, provider.clone(), config),
            tester: Specialist::new(Role::Tester, provider.clone(), config),
            debugger: Specialist::new(Role::Debugger, provider.clone(), config),
            tool: Specialist::new(Role::ToolExecutor, provider, config).with_tools(tools),
        }
    }

    /// Ask the planner for a plan. Unparseable output is fatal.
    pub async fn plan(&self, request: &str) -> Result<Plan> {
        let reply = self.planner.invoke(request).await?;
        let plan = Plan::from_planner_output(reply.content())?;
        info!(steps = plan.len(), "Plan created");
        Ok(plan)
    }
}

//! `taskforge plan`: plan a request and execute it with specialist agents.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use taskforge_agent::{Approver, Orchestrator, PendingApproval, SpecialistTeam};
use taskforge_core::event::EventSink;
use taskforge_tools::full_registry;
use tokio_util::sync::CancellationToken;

use super::{follow, load_runtime};
use crate::render;

pub async fn run(request: String) -> anyhow::Result<()> {
    let runtime = load_runtime()?;
    let tools = Arc::new(full_registry(runtime.config.tools.shell_timeout()));
    let team = SpecialistTeam::new(
        runtime.provider,
        &runtime.config.agent_config(),
        tools.definitions(),
    );

    println!();
    println!("  Request: {request}");
    eprint!("  Planning...");
    let plan = team.plan(&request).await;
    eprint!("\r             \r");
    let plan = plan?;
    render::plan(&plan);

    let cancel = CancellationToken::new();
    let (sink, events) = EventSink::channel();
    let mut orchestrator = Orchestrator::new(plan, request, team, tools)
        .with_events(sink)
        .with_cancellation(cancel.clone());

    let handle = tokio::spawn(async move { orchestrator.run(&TerminalApprover).await });
    let outcome = follow(handle, events, &cancel).await?;
    render::orchestration(&outcome);
    Ok(())
}

/// Asks on the terminal before a sensitive batch runs.
struct TerminalApprover;

#[async_trait]
impl Approver for TerminalApprover {
    async fn approve(&self, pending: &PendingApproval) -> bool {
        println!();
        println!("  The following actions need your approval:");
        for call in pending.sensitive() {
            println!("    - {} {}", call.name, call.arguments);
        }
        let benign = pending.non_sensitive().len();
        if benign > 0 {
            println!("    (plus {benign} read-only call(s) in the same batch)");
        }
        print!("  Proceed? [y/N] ");
        let _ = std::io::stdout().flush();

        let answer = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

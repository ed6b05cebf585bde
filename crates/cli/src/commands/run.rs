//! `taskforge run`: drive one task through the ReAct loop.

use std::sync::Arc;

use taskforge_agent::ReactEngine;
use taskforge_tools::basic_registry;
use tokio_util::sync::CancellationToken;

use super::{follow, load_runtime};
use crate::render;

pub async fn run(task: String, max_iterations: Option<u32>) -> anyhow::Result<()> {
    let runtime = load_runtime()?;
    let tools = Arc::new(basic_registry(runtime.config.tools.shell_timeout()));
    let cancel = CancellationToken::new();

    let mut engine = ReactEngine::new(runtime.provider, tools, runtime.config.agent_config())
        .with_cancellation(cancel.clone());
    if let Some(max) = max_iterations {
        engine = engine.with_max_iterations(max);
    }

    println!();
    println!("  Task: {task}");
    println!();

    let (handle, events) = engine.run_stream(&task);
    let outcome = follow(handle, events, &cancel).await?;
    render::outcome(&outcome);
    Ok(())
}

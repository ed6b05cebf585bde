pub mod init;
pub mod interactive;
pub mod plan;
pub mod run;
pub mod tools;

use std::sync::Arc;

use anyhow::{Context, bail};
use taskforge_config::AppConfig;
use taskforge_core::error::{Error, Result};
use taskforge_core::event::StepEvent;
use taskforge_core::provider::Provider;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::render;

/// Loaded config plus the default provider built from it.
pub(crate) struct Runtime {
    pub config: AppConfig,
    pub provider: Arc<dyn Provider>,
}

pub(crate) fn load_runtime() -> anyhow::Result<Runtime> {
    let config = AppConfig::load().context("Failed to load config")?;

    // Check for an API key early: give a clear error
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        for var in taskforge_config::API_KEY_VARS {
            eprintln!("    {var}");
        }
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        bail!("No API key found");
    }

    let router = taskforge_providers::build_from_config(&config)?;
    let provider = router
        .default_provider()
        .context("No default provider configured")?;

    info!(
        provider = %config.default_provider,
        model = %config.effective_model(),
        "Runtime ready"
    );
    Ok(Runtime { config, provider })
}

/// Render events until `handle` finishes.
///
/// The first Ctrl-C trips `cancel` and lets the run stop on its own; a
/// second one stops waiting for it.
pub(crate) async fn follow<T>(
    mut handle: JoinHandle<Result<T>>,
    mut events: UnboundedReceiver<StepEvent>,
    cancel: &CancellationToken,
) -> Result<T> {
    loop {
        tokio::select! {
            Some(event) = events.recv() => render::event(&event),
            _ = tokio::signal::ctrl_c() => {
                if cancel.is_cancelled() {
                    handle.abort();
                    return Err(Error::Cancelled);
                }
                eprintln!("\n  Interrupted. Stopping after the current step (Ctrl-C again to abort)...");
                cancel.cancel();
            }
            joined = &mut handle => {
                while let Ok(event) = events.try_recv() {
                    render::event(&event);
                }
                return match joined {
                    Ok(result) => result,
                    Err(e) => Err(Error::Internal(format!("run task failed: {e}"))),
                };
            }
        }
    }
}

//! TaskForge CLI: the main entry point.
//!
//! Commands:
//! - `run`         - Drive one task through the ReAct loop
//! - `plan`        - Plan a request and execute it with specialist agents
//! - `interactive` - Queue tasks line by line
//! - `tools`       - List the built-in tools
//! - `init`        - Write the default config file

use clap::{Parser, Subcommand};

mod commands;
mod render;

#[derive(Parser)]
#[command(
    name = "taskforge",
    about = "TaskForge — an autonomous task agent for your terminal",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single task with the ReAct agent
    Run {
        /// What the agent should do
        task: String,

        /// Override agent.max_iterations
        #[arg(short, long)]
        max_iterations: Option<u32>,
    },

    /// Plan a request, then execute it step by step with specialist agents
    Plan {
        /// The request to plan and execute
        request: String,
    },

    /// Enter tasks line by line; each runs in a fresh conversation
    Interactive,

    /// List the built-in tools and whether they need approval
    Tools,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the step events.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            task,
            max_iterations,
        } => commands::run::run(task, max_iterations).await,
        Commands::Plan { request } => commands::plan::run(request).await,
        Commands::Interactive => commands::interactive::run().await,
        Commands::Tools => commands::tools::run(),
        Commands::Init { force } => commands::init::run(force),
    };

    if let Err(e) = result {
        let cancelled = matches!(
            e.downcast_ref::<taskforge_core::Error>(),
            Some(taskforge_core::Error::Cancelled)
        );
        eprintln!("  [error] {e:#}");
        // Exit directly: a pending stdin read would otherwise hold up runtime shutdown.
        std::process::exit(if cancelled { 130 } else { 1 });
    }
}

//! `taskforge interactive`: a queue of tasks fed from stdin.
//!
//! Each task runs on a fresh engine with an empty conversation. Lines typed
//! while a task runs are queued behind it. Ctrl-C cancels the running task
//! and clears the queue; Ctrl-C while idle exits.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::Arc;

use taskforge_agent::ReactEngine;
use taskforge_core::error::Error;
use taskforge_tools::basic_registry;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::load_runtime;
use crate::render;

pub async fn run() -> anyhow::Result<()> {
    let runtime = load_runtime()?;
    let tools = Arc::new(basic_registry(runtime.config.tools.shell_timeout()));
    let engine = ReactEngine::new(runtime.provider, tools, runtime.config.agent_config());

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        TaskForge — Interactive Mode          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", runtime.config.default_provider);
    println!("  Model:     {}", engine.config().model);
    println!("  Tools:     read_file, write_file, create_folder, run_command");
    println!();
    println!("  Type a task and press Enter. Tasks typed during a run are queued.");
    println!("  Ctrl+C stops the current task; 'exit' quits.");
    println!();

    // A dedicated reader thread: a blocking stdin read can't be cancelled.
    let (line_tx, mut lines) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut queue: VecDeque<String> = VecDeque::new();
    let mut stdin_open = true;

    loop {
        let Some(task) = queue.pop_front() else {
            if !stdin_open {
                break;
            }
            prompt();
            tokio::select! {
                line = lines.recv() => match line {
                    Some(line) => {
                        if !enqueue(&mut queue, line) {
                            break;
                        }
                    }
                    None => stdin_open = false,
                },
                _ = tokio::signal::ctrl_c() => break,
            }
            continue;
        };

        println!();
        println!("  Task: {task}");
        let cancel = CancellationToken::new();
        let (mut handle, mut events) = engine
            .clone()
            .with_cancellation(cancel.clone())
            .run_stream(&task);

        loop {
            tokio::select! {
                Some(event) = events.recv() => render::event(&event),
                line = lines.recv(), if stdin_open => match line {
                    Some(line) => {
                        let before = queue.len();
                        if enqueue(&mut queue, line.clone()) {
                            if queue.len() > before {
                                println!("  (queued: {})", line.trim());
                            }
                        } else {
                            // Quit once the queue drains
                            stdin_open = false;
                        }
                    }
                    None => stdin_open = false,
                },
                _ = tokio::signal::ctrl_c() => {
                    if cancel.is_cancelled() {
                        handle.abort();
                    } else {
                        let dropped = queue.len();
                        queue.clear();
                        cancel.cancel();
                        eprintln!("\n  Interrupted. Cancelling task, {dropped} queued task(s) dropped.");
                    }
                }
                joined = &mut handle => {
                    while let Ok(event) = events.try_recv() {
                        render::event(&event);
                    }
                    match joined {
                        Ok(Ok(outcome)) => render::outcome(&outcome),
                        Ok(Err(Error::Cancelled)) => println!("  Task cancelled."),
                        Ok(Err(e)) => eprintln!("  [error] {e}"),
                        Err(e) if e.is_cancelled() => println!("  Task aborted."),
                        Err(e) => eprintln!("  [error] run task failed: {e}"),
                    }
                    break;
                }
            }
        }
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

/// Queue a non-empty line. Returns false when the user asked to quit.
fn enqueue(queue: &mut VecDeque<String>, line: String) -> bool {
    let task = line.trim();
    match task {
        "" => true,
        "exit" | "quit" => false,
        _ => {
            debug!(queued = queue.len() + 1, "Task queued");
            queue.push_back(task.to_string());
            true
        }
    }
}

fn prompt() {
    print!("  Task > ");
    let _ = std::io::stdout().flush();
}

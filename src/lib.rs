// src/lib.rs

//! Run a graph of dependent tasks with maximum parallelism.
//!
//! Build a [`Flow`] from [`Task`]s, then [`Flow::run`] it:
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use taskflow::{Flow, Opts, Task, TaskFn};
//!
//! let flow = Flow::from_tasks(
//!     "release",
//!     [
//!         Task::new("build", TaskFn::new(|_| async { Ok(()) })),
//!         Task::new("test", TaskFn::noop()).after("build"),
//!         Task::new("docs", TaskFn::noop()).after("build"),
//!     ],
//! )?;
//!
//! flow.run(Opts::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! The rest of the crate wires this into the `taskflow` binary: a TOML flow
//! file whose tasks are shell commands.

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;

pub use crate::dag::{Flow, Graph, Stats, Task, TaskFn, TaskId, TaskIds};
pub use crate::engine::{CancelCause, CancelToken, FlowError, Opts, TaskError, was_canceled};
pub use crate::errors::BuildError;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - graph compilation
/// - the optional global deadline
/// - Ctrl-C handling
/// - progress logging
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let flow = cfg.to_graph().compile()?;
    let cancel = CancelToken::new();

    if let Some(timeout) = args.timeout.or(cfg.flow.timeout) {
        info!(%timeout, "flow deadline set");
        cancel.cancel_after(timeout.as_duration());
    }

    // On Ctrl-C, stop launching new tasks and let running ones wind down.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            warn!("Ctrl-C received; cancelling flow");
            cancel.cancel_with(CancelCause::Other("interrupted".to_string()));
        });
    }

    let opts = Opts::new()
        .with_current_logger()
        .with_cancel(cancel)
        .with_progress_reporter(log_progress);

    flow.run(opts).await?;
    info!(flow = flow.name(), "all tasks succeeded");
    Ok(())
}

fn log_progress(stats: Stats) {
    info!(
        progress = stats.progress_percent(),
        running = ?stats.running.names(),
        succeeded = stats.succeeded.len(),
        failed = stats.failed.len(),
        pending = stats.pending.len(),
        "flow progress"
    );
}

/// Simple dry-run output: print tasks, deps and commands.
fn print_dry_run(cfg: &ConfigFile) {
    println!("taskflow dry-run");
    println!("  flow.name = {}", cfg.name());
    if let Some(timeout) = cfg.flow.timeout {
        println!("  flow.timeout = {timeout}");
    }
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if let Some(timeout) = task.timeout {
            println!("      timeout: {timeout}");
        }
        if let Some(interval) = task.retry_interval {
            println!("      retry_interval: {interval}");
        }
    }

    debug!("dry-run complete (no execution)");
}

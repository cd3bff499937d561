// src/logging.rs

//! Process-wide `tracing` subscriber for the `taskflow` binary.
//!
//! The filter comes from `--log-level` when given, otherwise from the
//! `TASKFLOW_LOG` environment variable (full `EnvFilter` directive syntax,
//! e.g. `info,taskflow::exec=debug`), otherwise `info`.
//!
//! Output goes to stderr; stdout is reserved for `--dry-run`.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable read when no level is given on the command line.
pub const LOG_ENV: &str = "TASKFLOW_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_env_filter(filter_for(cli_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!(e))
}

fn filter_for(cli_level: Option<LogLevel>) -> EnvFilter {
    match cli_level {
        Some(level) => EnvFilter::new(level.as_directive()),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

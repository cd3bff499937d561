// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;
use crate::types::HumanDuration;

/// Command-line arguments for `taskflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskflow",
    version,
    about = "Run a dependency graph of shell commands with maximum parallelism.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the flow file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Cancel the run after this long (e.g. "90s", "10m").
    ///
    /// Overrides `[flow].timeout` from the flow file.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<HumanDuration>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the graph, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The level as an `EnvFilter` directive.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parses_flags() {
        let args = CliArgs::try_parse_from([
            "taskflow",
            "--config",
            "ci.toml",
            "--timeout",
            "90s",
            "--log-level",
            "debug",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("ci.toml"));
        assert_eq!(args.timeout.map(|t| t.0), Some(Duration::from_secs(90)));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.dry_run);
    }

    #[test]
    fn config_defaults_to_taskflow_toml() {
        let args = CliArgs::try_parse_from(["taskflow"]).unwrap();
        assert_eq!(args.config, default_config_path());
        assert!(!args.dry_run);
    }

    #[test]
    fn rejects_bad_timeout() {
        assert!(CliArgs::try_parse_from(["taskflow", "--timeout", "soon"]).is_err());
    }
}

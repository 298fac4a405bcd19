// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `shardsched`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "shardsched",
    version,
    about = "Run a dependency graph of shard commands on a bounded worker pool.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job file (TOML).
    ///
    /// Default: `Shards.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Maximum number of shards running at once.
    ///
    /// Overrides `[config].max_concurrent_tasks` from the job file.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_concurrent: Option<u32>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SHARDSCHED_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the shard graph, but don't execute anything.
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

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

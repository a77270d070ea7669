// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::RunMode;

/// Command-line arguments for `monorun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "monorun",
    version,
    about = "Run scripts across the packages of a monorepo in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Workspace root (the directory holding `packages/`).
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Config file. Default: `monorun.toml` in the workspace root, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MONORUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a manifest script in every unit that defines it.
    Run {
        /// Script name, as listed under `scripts` in the manifests.
        script: String,

        #[arg(long, value_enum, default_value_t = RunMode::Parallel)]
        mode: RunMode,

        /// Report failing units but keep running the others.
        #[arg(long)]
        allow_failure: bool,

        /// Include units marked `"private": true`.
        #[arg(long)]
        include_private: bool,
    },

    /// List unit names and folders.
    List {
        #[arg(long)]
        include_private: bool,
    },

    /// Print units in dependency order.
    Order {
        /// Dependents first.
        #[arg(long)]
        reverse: bool,

        #[arg(long)]
        include_private: bool,
    },

    /// Print the units that directly depend on a unit.
    Dependents {
        name: String,

        #[arg(long)]
        include_private: bool,
    },
}

impl Command {
    pub fn include_private(&self) -> bool {
        match self {
            Command::Run { include_private, .. }
            | Command::List { include_private }
            | Command::Order { include_private, .. }
            | Command::Dependents { include_private, .. } => *include_private,
        }
    }
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

// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod progress;
pub mod render;
pub mod runner;
pub mod scheduler;
pub mod types;
pub mod workspace;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, load_and_validate, load_or_default};
use crate::errors::MonorunError;
use crate::fs::RealFileSystem;
use crate::progress::TaskList;
use crate::render::Renderer;
use crate::runner::{RunOptions, RunSummary, ShellRunner, run_in_all};
use crate::scheduler::topological_order;
use crate::workspace::Workspace;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - workspace discovery
/// - scheduler / task runner
/// - progress rendering
pub async fn run(args: CliArgs) -> Result<()> {
    let root = args.root.as_path();
    let cfg = match &args.config {
        Some(path) => load_and_validate(path)?,
        None => load_or_default(root)?,
    };

    let workspace = load_workspace(root, &cfg, args.command.include_private())?;
    info!(root = %root.display(), units = workspace.len(), "workspace ready");

    match &args.command {
        Command::Run {
            script,
            mode,
            allow_failure,
            ..
        } => {
            let options = RunOptions {
                mode: *mode,
                allow_failure: *allow_failure,
            };
            run_script(&workspace, &cfg, script, &options).await
        }
        Command::List { .. } => {
            for unit in workspace.units() {
                println!("{}\t{}", unit.name, unit.folder.display());
            }
            Ok(())
        }
        Command::Order { reverse, .. } => {
            let mut order = topological_order(&workspace);
            if *reverse {
                order.reverse();
            }
            for unit in order {
                println!("{}", unit.name);
            }
            Ok(())
        }
        Command::Dependents { name, .. } => {
            let unit = workspace
                .get(name)
                .ok_or_else(|| MonorunError::UnknownUnit(name.clone()))?;
            for dependent in workspace.direct_dependents_of(unit) {
                println!("{}", dependent.name);
            }
            Ok(())
        }
    }
}

fn load_workspace(root: &Path, cfg: &ConfigFile, include_private: bool) -> Result<Workspace> {
    let mut section = cfg.workspace().clone();
    section.include_private |= include_private;
    Ok(Workspace::load(&RealFileSystem, root, &section)?)
}

async fn run_script(
    workspace: &Workspace,
    cfg: &ConfigFile,
    script: &str,
    options: &RunOptions,
) -> Result<()> {
    let list = TaskList::new("monorun");
    let renderer = Renderer::stdout(&list, cfg.render());
    debug!(mode = ?renderer.mode(), "renderer attached");

    let task = list.start_task(format!("{script} ({})", options.mode));
    let runner = Arc::new(ShellRunner::new(workspace.root()));
    let result = run_in_all(workspace, script, options, Some(&task), runner).await;

    match &result {
        Ok(summary) if summary.failed.is_empty() => task.finish(),
        Ok(summary) => task.error(&format!("failed: {}", summary.failed.join(", "))),
        Err(e) => task.error(&e.to_string()),
    }
    renderer.finish().await;

    let summary = result?;
    print_summary(script, &summary);
    Ok(())
}

fn print_summary(script: &str, summary: &RunSummary) {
    println!(
        "{script}: {} succeeded, {} failed, {} without script",
        summary.succeeded.len(),
        summary.failed.len(),
        summary.missing_script.len()
    );
    if !summary.failed.is_empty() {
        println!("failed: {}", summary.failed.join(", "));
    }
}

// src/runner/mod.rs

//! Run one manifest script in every workspace unit.
//!
//! This composes the scheduler with a [`ProcessRunner`] and the progress
//! tree: each unit that defines the script gets a subtask, the process
//! output is logged into it, and the exit code decides whether it finishes
//! or fails.

pub mod process;

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::errors::{MonorunError, Result};
use crate::progress::TaskHandle;
use crate::scheduler::{Flow, visit_in_order, visit_in_order_parallel, visit_unordered};
use crate::types::RunMode;
use crate::workspace::{Unit, UnitName, Workspace};

pub use process::{LineSink, ProcessRunner, ShellRunner};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Mark failing units as errors but keep going instead of failing the run.
    pub allow_failure: bool,
}

/// What happened to each unit during `run_in_all`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: Vec<UnitName>,
    /// Units whose script failed while failures were allowed.
    pub failed: Vec<UnitName>,
    /// Units that do not define the script.
    pub missing_script: Vec<UnitName>,
}

impl RunSummary {
    fn sorted(mut self) -> Self {
        self.succeeded.sort();
        self.failed.sort();
        self.missing_script.sort();
        self
    }
}

type SharedSummary = Arc<Mutex<RunSummary>>;

/// Run `script` in every unit of `workspace` that defines it.
///
/// With a `parent` handle, every unit that runs the script reports to a
/// subtask of it. A non-zero exit fails the run with
/// [`MonorunError::ScriptFailed`] (wrapped by the scheduler's error for the
/// chosen mode) unless `options.allow_failure` is set.
pub async fn run_in_all(
    workspace: &Workspace,
    script: &str,
    options: &RunOptions,
    parent: Option<&TaskHandle>,
    runner: Arc<dyn ProcessRunner>,
) -> Result<RunSummary> {
    info!(script = %script, mode = %options.mode, units = workspace.len(), "running script in all units");

    let summary: SharedSummary = Arc::default();
    let script: Arc<str> = Arc::from(script);
    let allow_failure = options.allow_failure;

    match options.mode {
        RunMode::Sequential => {
            let parent = parent.cloned();
            let summary = Arc::clone(&summary);
            visit_in_order(workspace, move |unit| {
                let node = parent.as_ref().map(|p| p.subtask(unit.name.as_str()));
                let script = Arc::clone(&script);
                let runner = Arc::clone(&runner);
                let summary = Arc::clone(&summary);
                async move {
                    run_script(unit, &script, node, allow_failure, runner.as_ref(), &summary).await?;
                    Ok(Flow::Continue)
                }
            })
            .await?;
        }
        RunMode::Parallel | RunMode::Unordered => {
            let visitor = {
                let summary = Arc::clone(&summary);
                move |unit: Arc<Unit>, node: Option<TaskHandle>| {
                    let script = Arc::clone(&script);
                    let runner = Arc::clone(&runner);
                    let summary = Arc::clone(&summary);
                    async move {
                        run_script(unit, &script, node, allow_failure, runner.as_ref(), &summary).await
                    }
                }
            };
            if options.mode == RunMode::Parallel {
                visit_in_order_parallel(workspace, parent, visitor).await?;
            } else {
                visit_unordered(workspace, parent, visitor).await?;
            }
        }
    }

    let summary = summary
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .sorted();
    info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        missing_script = summary.missing_script.len(),
        "script finished in all units"
    );
    Ok(summary)
}

async fn run_script(
    unit: Arc<Unit>,
    script: &str,
    node: Option<TaskHandle>,
    allow_failure: bool,
    runner: &dyn ProcessRunner,
    summary: &SharedSummary,
) -> anyhow::Result<()> {
    let Some(command) = unit.manifest.script(script) else {
        debug!(unit = %unit.name, script = %script, "unit has no such script; skipping");
        if let Some(node) = node {
            node.delete();
        }
        record(summary, |s| s.missing_script.push(unit.name.clone()));
        return Ok(());
    };

    let sink: LineSink = match &node {
        Some(node) => {
            let node = node.clone();
            Arc::new(move |line: &str| node.log(line))
        }
        None => {
            let name = unit.name.clone();
            Arc::new(move |line: &str| info!(unit = %name, "{line}"))
        }
    };

    let code = match runner.run(command, &unit.folder, sink).await {
        Ok(code) => code,
        Err(e) => {
            if let Some(node) = &node {
                node.error(&format!("{e:#}"));
            }
            return Err(e);
        }
    };

    if code == 0 {
        if let Some(node) = &node {
            node.finish();
        }
        record(summary, |s| s.succeeded.push(unit.name.clone()));
        return Ok(());
    }

    let message = format!("`{script}` exited with code {code}");
    if let Some(node) = &node {
        node.error(&message);
    }

    if allow_failure {
        warn!(unit = %unit.name, exit_code = code, "script failed; continuing");
        record(summary, |s| s.failed.push(unit.name.clone()));
        Ok(())
    } else {
        Err(MonorunError::ScriptFailed {
            unit: unit.name.clone(),
            script: script.to_string(),
            code,
        }
        .into())
    }
}

fn record(summary: &SharedSummary, f: impl FnOnce(&mut RunSummary)) {
    f(&mut summary.lock().unwrap_or_else(PoisonError::into_inner));
}

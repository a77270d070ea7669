// src/scheduler/parallel.rs

//! Parallel visitation.
//!
//! Every unit gets a [`Settlement`] before anything starts, then one Tokio
//! task per unit is launched at once. A unit's task waits for each of its
//! in-workspace dependencies to settle and only then runs the visitor. There
//! is no concurrency cap.
//!
//! When a dependency settles as anything but success, the waiting unit does
//! not run its visitor: it settles as [`Settled::Skipped`] and its progress
//! node is marked failed. Units on unaffected branches keep going, and the
//! walk reports every failed and skipped unit once all tasks are done.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::{MonorunError, Result};
use crate::progress::{TaskHandle, TaskStatus};
use crate::scheduler::settle::{Settled, Settlement};
use crate::workspace::{Unit, UnitName, Workspace};

type Settlements = Arc<HashMap<UnitName, Settlement>>;

/// How one unit's task ended.
#[derive(Debug)]
enum UnitOutcome {
    Completed,
    Failed,
    Skipped,
}

/// Run `visitor` for every unit, each one as soon as all of its in-workspace
/// dependencies have settled.
///
/// With a `parent` handle each unit reports to its own subtask, titled with
/// the unit name, which is passed to the visitor. A subtask the visitor
/// leaves running is finished (or failed) once the visitor returns.
///
/// Fails up front with [`MonorunError::DependencyCycle`] if the units form a
/// cycle, and at the end with [`MonorunError::ParallelRunFailed`] if any unit
/// failed or was skipped.
pub async fn visit_in_order_parallel<F, Fut>(
    workspace: &Workspace,
    parent: Option<&TaskHandle>,
    visitor: F,
) -> Result<()>
where
    F: Fn(Arc<Unit>, Option<TaskHandle>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    workspace.ensure_acyclic()?;
    run_all(workspace, parent, visitor, true).await
}

/// Run `visitor` for every unit at once, ignoring dependencies.
pub async fn visit_unordered<F, Fut>(
    workspace: &Workspace,
    parent: Option<&TaskHandle>,
    visitor: F,
) -> Result<()>
where
    F: Fn(Arc<Unit>, Option<TaskHandle>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    run_all(workspace, parent, visitor, false).await
}

async fn run_all<F, Fut>(
    workspace: &Workspace,
    parent: Option<&TaskHandle>,
    visitor: F,
    respect_dependencies: bool,
) -> Result<()>
where
    F: Fn(Arc<Unit>, Option<TaskHandle>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    // All cells exist before the first visitor can run.
    let settlements: Settlements = Arc::new(
        workspace
            .units()
            .iter()
            .map(|unit| (unit.name.clone(), Settlement::new()))
            .collect(),
    );
    let visitor = Arc::new(visitor);
    let mut tasks = JoinSet::new();

    info!(units = workspace.len(), respect_dependencies, "starting parallel walk");

    for unit in workspace.units() {
        let pending: BTreeSet<UnitName> = if respect_dependencies {
            workspace
                .dependencies_of(unit)
                .into_iter()
                .filter(|dep| settlements.contains_key(*dep))
                .map(str::to_string)
                .collect()
        } else {
            BTreeSet::new()
        };
        let handle = parent.map(|p| p.subtask(unit.name.as_str()));

        tasks.spawn(run_unit(
            Arc::clone(unit),
            pending,
            handle,
            Arc::clone(&settlements),
            Arc::clone(&visitor),
        ));
    }

    let mut failed = Vec::new();
    let mut skipped = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, UnitOutcome::Completed)) => {}
            Ok((name, UnitOutcome::Failed)) => failed.push(name),
            Ok((name, UnitOutcome::Skipped)) => skipped.push(name),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => return Err(anyhow::Error::from(e).into()),
        }
    }

    if failed.is_empty() && skipped.is_empty() {
        info!("parallel walk finished");
        return Ok(());
    }

    failed.sort();
    skipped.sort();
    warn!(?failed, ?skipped, "parallel walk finished with failures");
    Err(MonorunError::ParallelRunFailed { failed, skipped })
}

async fn run_unit<F, Fut>(
    unit: Arc<Unit>,
    mut pending: BTreeSet<UnitName>,
    handle: Option<TaskHandle>,
    settlements: Settlements,
    visitor: Arc<F>,
) -> (UnitName, UnitOutcome)
where
    F: Fn(Arc<Unit>, Option<TaskHandle>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let name = unit.name.clone();
    let own = &settlements[&name];

    // Each dependency is watched by its own task so the waiting detail
    // shrinks in settlement order.
    let mut waits = JoinSet::new();
    for dep in pending.iter().cloned() {
        let settlements = Arc::clone(&settlements);
        waits.spawn(async move {
            let settled = settlements[&dep].settled().await;
            (dep, settled)
        });
    }

    set_waiting(handle.as_ref(), &pending);
    while let Some(joined) = waits.join_next().await {
        let (dep, settled) = match joined {
            Ok(pair) => pair,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                // Only during runtime shutdown.
                warn!(unit = %name, error = %e, "dependency wait was cancelled");
                let dep = pending.first().cloned().unwrap_or_default();
                return skip(name, dep, handle.as_ref(), own);
            }
        };
        pending.remove(&dep);

        if !settled.is_success() {
            debug!(unit = %name, dependency = %dep, "dependency did not succeed; skipping unit");
            return skip(name, dep, handle.as_ref(), own);
        }
        set_waiting(handle.as_ref(), &pending);
    }

    if let Some(h) = &handle {
        h.set_detail(None);
    }
    debug!(unit = %name, "dependencies settled; running visitor");

    match (*visitor)(Arc::clone(&unit), handle.clone()).await {
        Ok(()) => {
            if let Some(h) = handle.as_ref().filter(|h| h.status() == Some(TaskStatus::Running)) {
                h.finish();
            }
            own.resolve(Settled::Success);
            (name, UnitOutcome::Completed)
        }
        Err(e) => {
            warn!(unit = %name, error = %e, "visitor failed");
            if let Some(h) = handle.as_ref().filter(|h| h.status() == Some(TaskStatus::Running)) {
                h.error(&e.to_string());
            }
            own.resolve(Settled::Failed(Arc::new(e)));
            (name, UnitOutcome::Failed)
        }
    }
}

fn skip(
    name: UnitName,
    dependency: UnitName,
    handle: Option<&TaskHandle>,
    own: &Settlement,
) -> (UnitName, UnitOutcome) {
    if let Some(h) = handle {
        h.set_detail(None);
        h.error(&format!("skipped: dependency '{dependency}' failed"));
    }
    own.resolve(Settled::Skipped { dependency });
    (name, UnitOutcome::Skipped)
}

fn set_waiting(handle: Option<&TaskHandle>, pending: &BTreeSet<UnitName>) {
    if let Some(h) = handle {
        if pending.is_empty() {
            return;
        }
        let names: Vec<&str> = pending.iter().map(String::as_str).collect();
        h.set_detail(Some(format!("waiting for: {}", names.join(", "))));
    }
}

// src/scheduler/sequential.rs

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{MonorunError, Result};
use crate::workspace::{Unit, Workspace};

/// What a sequential visitor wants the walk to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Every unit in dependency order: a depth-first post-order walk starting
/// from each unit in workspace order.
///
/// A unit is marked visited before its dependencies are descended into, so a
/// dependency cycle is cut where it closes instead of failing. The cut is
/// logged at `warn`.
pub fn topological_order(workspace: &Workspace) -> Vec<Arc<Unit>> {
    let mut visited = HashSet::new();
    let mut on_stack = HashSet::new();
    let mut order = Vec::with_capacity(workspace.len());

    for unit in workspace.units() {
        descend(workspace, unit, &mut visited, &mut on_stack, &mut order);
    }

    order
}

fn descend<'a>(
    workspace: &'a Workspace,
    unit: &'a Arc<Unit>,
    visited: &mut HashSet<&'a str>,
    on_stack: &mut HashSet<&'a str>,
    order: &mut Vec<Arc<Unit>>,
) {
    if !visited.insert(unit.name.as_str()) {
        if on_stack.contains(unit.name.as_str()) {
            warn!(unit = %unit.name, "dependency cycle; skipping back edge");
        }
        return;
    }
    on_stack.insert(unit.name.as_str());

    for dep in workspace.dependencies_of(unit) {
        if let Some(dep_unit) = workspace.get(dep) {
            descend(workspace, dep_unit, visited, on_stack, order);
        }
    }

    on_stack.remove(unit.name.as_str());
    order.push(Arc::clone(unit));
}

/// Visit every unit after all of its in-workspace dependencies.
///
/// Stops as soon as the visitor returns [`Flow::Stop`] and reports that as
/// the result. A visitor error ends the walk with
/// [`MonorunError::VisitFailed`].
pub async fn visit_in_order<F, Fut>(workspace: &Workspace, visitor: F) -> Result<Flow>
where
    F: FnMut(Arc<Unit>) -> Fut,
    Fut: Future<Output = anyhow::Result<Flow>>,
{
    visit_all(topological_order(workspace), visitor).await
}

/// Like [`visit_in_order`], but dependents come before their dependencies.
pub async fn visit_in_reverse_order<F, Fut>(workspace: &Workspace, visitor: F) -> Result<Flow>
where
    F: FnMut(Arc<Unit>) -> Fut,
    Fut: Future<Output = anyhow::Result<Flow>>,
{
    let mut order = topological_order(workspace);
    order.reverse();
    visit_all(order, visitor).await
}

/// Visit the units that name `unit` in their `dependencies` map.
///
/// Only immediate dependents are visited; peer and dev dependencies do not
/// count.
pub async fn visit_dependents<F, Fut>(workspace: &Workspace, unit: &Unit, visitor: F) -> Result<Flow>
where
    F: FnMut(Arc<Unit>) -> Fut,
    Fut: Future<Output = anyhow::Result<Flow>>,
{
    let dependents = workspace
        .direct_dependents_of(unit)
        .into_iter()
        .cloned()
        .collect();
    visit_all(dependents, visitor).await
}

async fn visit_all<F, Fut>(units: Vec<Arc<Unit>>, mut visitor: F) -> Result<Flow>
where
    F: FnMut(Arc<Unit>) -> Fut,
    Fut: Future<Output = anyhow::Result<Flow>>,
{
    for unit in units {
        let name = unit.name.clone();
        debug!(unit = %name, "visiting unit");

        match visitor(unit).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Stop) => {
                debug!(unit = %name, "visitor requested stop; ending walk");
                return Ok(Flow::Stop);
            }
            Err(source) => {
                return Err(MonorunError::VisitFailed { unit: name, source });
            }
        }
    }

    Ok(Flow::Continue)
}

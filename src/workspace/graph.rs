// src/workspace/graph.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::config::WorkspaceSection;
use crate::errors::{MonorunError, Result};
use crate::fs::FileSystem;
use crate::workspace::discover::list_units;
use crate::workspace::manifest::Unit;

/// The units of one run, immutable once loaded.
///
/// Edges only exist between units of this workspace: a dependency whose name
/// is not a unit here is an external registry package and is ignored for
/// ordering.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    units: Vec<Arc<Unit>>,
    index: HashMap<String, usize>,
}

impl Workspace {
    /// Build a workspace from already-loaded units.
    ///
    /// Unit names must be unique.
    pub fn new(root: impl Into<PathBuf>, units: Vec<Unit>) -> Result<Self> {
        let mut index = HashMap::with_capacity(units.len());
        for (i, unit) in units.iter().enumerate() {
            if index.insert(unit.name.clone(), i).is_some() {
                return Err(MonorunError::Manifest {
                    path: unit.folder.clone(),
                    message: format!("duplicate unit name '{}'", unit.name),
                });
            }
        }

        Ok(Self {
            root: root.into(),
            units: units.into_iter().map(Arc::new).collect(),
            index,
        })
    }

    /// Discover and load every unit under `root`.
    pub fn load(fs: &dyn FileSystem, root: impl AsRef<Path>, section: &WorkspaceSection) -> Result<Self> {
        let root = root.as_ref();
        let units = list_units(fs, root, section)?;
        let workspace = Self::new(root, units)?;
        debug!(units = workspace.len(), "workspace loaded");
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Units in discovery order.
    pub fn units(&self) -> &[Arc<Unit>] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Unit>> {
        self.index.get(name).map(|&i| &self.units[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names of the in-workspace units `unit` depends on, across all three
    /// dependency maps, in name order.
    pub fn dependencies_of(&self, unit: &Unit) -> Vec<&str> {
        unit.manifest
            .dependency_set()
            .into_keys()
            .filter_map(|name| self.index.get(&name).map(|&i| self.units[i].name.as_str()))
            .collect()
    }

    /// Units that list `unit` in their direct `dependencies` map.
    ///
    /// Peer and dev dependencies are not considered, and only immediate
    /// dependents are returned.
    pub fn direct_dependents_of(&self, unit: &Unit) -> Vec<&Arc<Unit>> {
        self.units
            .iter()
            .filter(|candidate| candidate.manifest.dependencies.contains_key(&unit.name))
            .collect()
    }

    /// Fail with [`MonorunError::DependencyCycle`] if the in-workspace
    /// dependency graph has a cycle.
    pub fn ensure_acyclic(&self) -> Result<()> {
        // Edge direction: dependency -> dependent.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for unit in self.units.iter() {
            graph.add_node(unit.name.as_str());
        }

        for unit in self.units.iter() {
            for dep in self.dependencies_of(unit) {
                graph.add_edge(dep, unit.name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(MonorunError::DependencyCycle(format!(
                "cycle detected involving unit '{}'",
                cycle.node_id()
            ))),
        }
    }
}

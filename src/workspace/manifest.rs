// src/workspace/manifest.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{MonorunError, Result};

/// The parts of a unit's `package.json` that the orchestrator reads.
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    /// Private units are skipped by discovery unless explicitly included.
    #[serde(default)]
    pub private: bool,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,

    /// Script name -> shell command.
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl Manifest {
    /// Parse a manifest from its JSON text. `path` is only used for the error.
    pub fn from_json(path: &Path, contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| MonorunError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Union of `dependencies`, `peerDependencies` and `devDependencies`.
    ///
    /// A name present in several maps resolves to its `devDependencies`
    /// range. Only the names matter for ordering; ranges are never checked.
    pub fn dependency_set(&self) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();
        for map in [
            &self.dependencies,
            &self.peer_dependencies,
            &self.dev_dependencies,
        ] {
            for (name, range) in map {
                merged.insert(name.clone(), range.clone());
            }
        }
        merged
    }

    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }
}

/// One buildable package of the workspace.
#[derive(Debug, Clone)]
pub struct Unit {
    pub name: String,
    pub folder: PathBuf,
    pub manifest: Manifest,
}

impl Unit {
    pub fn new(name: impl Into<String>, folder: impl Into<PathBuf>, manifest: Manifest) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
            manifest,
        }
    }

    /// Build a unit from a loaded manifest, or `None` if it has no name.
    pub fn from_manifest(folder: impl Into<PathBuf>, manifest: Manifest) -> Option<Self> {
        let name = manifest.name.clone().filter(|n| !n.trim().is_empty())?;
        Some(Self::new(name, folder, manifest))
    }

    /// See [`Manifest::dependency_set`].
    pub fn dependency_set(&self) -> BTreeMap<String, String> {
        self.manifest.dependency_set()
    }
}

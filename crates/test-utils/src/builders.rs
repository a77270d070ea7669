#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use monorun::fs::mock::MockFileSystem;
use monorun::workspace::{Manifest, Unit, Workspace};
use serde_json::{Map, Value, json};

/// Root used by [`WorkspaceBuilder`] for in-memory workspaces.
pub const WORKSPACE_ROOT: &str = "/ws";

/// Builder for a unit's `Manifest`.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    manifest: Manifest,
}

impl ManifestBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            manifest: Manifest {
                name: Some(name.to_string()),
                version: Some("1.0.0".to_string()),
                ..Manifest::default()
            },
        }
    }

    /// A manifest with no `name` key.
    pub fn nameless() -> Self {
        Self {
            manifest: Manifest::default(),
        }
    }

    pub fn dep(mut self, name: &str) -> Self {
        self.manifest.dependencies.insert(name.to_string(), "^1.0.0".to_string());
        self
    }

    pub fn dep_range(mut self, name: &str, range: &str) -> Self {
        self.manifest.dependencies.insert(name.to_string(), range.to_string());
        self
    }

    pub fn peer(mut self, name: &str) -> Self {
        self.manifest.peer_dependencies.insert(name.to_string(), "^1.0.0".to_string());
        self
    }

    pub fn dev(mut self, name: &str, range: &str) -> Self {
        self.manifest.dev_dependencies.insert(name.to_string(), range.to_string());
        self
    }

    pub fn script(mut self, name: &str, command: &str) -> Self {
        self.manifest.scripts.insert(name.to_string(), command.to_string());
        self
    }

    pub fn private(mut self) -> Self {
        self.manifest.private = true;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.manifest.name.as_deref()
    }

    pub fn build(self) -> Manifest {
        self.manifest
    }

    /// The manifest as `package.json` text.
    pub fn to_json(&self) -> String {
        fn map(m: &BTreeMap<String, String>) -> Value {
            Value::Object(
                m.iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect::<Map<_, _>>(),
            )
        }

        let m = &self.manifest;
        let mut obj = Map::new();
        if let Some(name) = &m.name {
            obj.insert("name".into(), json!(name));
        }
        if let Some(version) = &m.version {
            obj.insert("version".into(), json!(version));
        }
        if m.private {
            obj.insert("private".into(), json!(true));
        }
        obj.insert("dependencies".into(), map(&m.dependencies));
        obj.insert("peerDependencies".into(), map(&m.peer_dependencies));
        obj.insert("devDependencies".into(), map(&m.dev_dependencies));
        obj.insert("scripts".into(), map(&m.scripts));

        serde_json::to_string_pretty(&Value::Object(obj)).expect("manifest serializes")
    }
}

/// Builder for a workspace rooted at [`WORKSPACE_ROOT`], one unit per folder
/// under `packages/`. Folders are named after the unit.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceBuilder {
    units: Vec<(String, ManifestBuilder)>,
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(mut self, manifest: ManifestBuilder) -> Self {
        let folder = manifest.name().unwrap_or("unnamed").to_string();
        self.units.push((folder, manifest));
        self
    }

    /// Add a unit under an explicit folder name.
    pub fn unit_in(mut self, folder: &str, manifest: ManifestBuilder) -> Self {
        self.units.push((folder.to_string(), manifest));
        self
    }

    pub fn folder(folder: &str) -> PathBuf {
        Path::new(WORKSPACE_ROOT).join("packages").join(folder)
    }

    /// Build the workspace directly, in insertion order. Nameless manifests
    /// are dropped the way discovery drops them.
    pub fn build(self) -> Workspace {
        let units = self
            .units
            .into_iter()
            .filter_map(|(folder, m)| Unit::from_manifest(Self::folder(&folder), m.build()))
            .collect();
        Workspace::new(WORKSPACE_ROOT, units).expect("valid workspace")
    }

    /// Write every manifest into an in-memory filesystem.
    pub fn mock_fs(&self) -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_dir(Path::new(WORKSPACE_ROOT).join("packages"));
        for (folder, manifest) in &self.units {
            fs.add_file(Self::folder(folder).join("package.json"), manifest.to_json());
        }
        fs
    }
}

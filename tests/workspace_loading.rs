mod common;

use std::path::Path;

use common::{ManifestBuilder, WORKSPACE_ROOT, WorkspaceBuilder};
use monorun::config::WorkspaceSection;
use monorun::errors::MonorunError;
use monorun::fs::RealFileSystem;
use monorun::fs::mock::MockFileSystem;
use monorun::workspace::{Manifest, Workspace, list_units};

fn names(ws: &Workspace) -> Vec<&str> {
    ws.units().iter().map(|u| u.name.as_str()).collect()
}

#[test]
fn dependency_set_merges_maps_with_dev_winning() {
    let manifest = ManifestBuilder::new("app")
        .dep_range("shared", "^1.0.0")
        .peer("react")
        .dev("shared", "workspace:*")
        .build();

    let set = manifest.dependency_set();
    assert_eq!(set.len(), 2);
    assert_eq!(set["shared"], "workspace:*");
    assert_eq!(set["react"], "^1.0.0");
}

#[test]
fn manifest_parses_camel_case_keys_and_ignores_unknown_ones() {
    let json = r#"{
        "name": "@acme/app",
        "private": true,
        "peerDependencies": { "react": "^18" },
        "devDependencies": { "typescript": "^5" },
        "scripts": { "build": "tsc -b" },
        "license": "MIT"
    }"#;

    let manifest = Manifest::from_json(Path::new("package.json"), json).unwrap();
    assert_eq!(manifest.name.as_deref(), Some("@acme/app"));
    assert!(manifest.private);
    assert_eq!(manifest.script("build"), Some("tsc -b"));
    assert_eq!(manifest.script("test"), None);
    assert!(manifest.dependency_set().contains_key("react"));
    assert!(manifest.dependency_set().contains_key("typescript"));
}

#[test]
fn list_units_reads_every_package_folder() {
    let builder = WorkspaceBuilder::new()
        .unit(ManifestBuilder::new("a"))
        .unit(ManifestBuilder::new("b").dep("a"))
        .unit(ManifestBuilder::new("c").dep("b"));
    let fs = builder.mock_fs();

    let ws = Workspace::load(&fs, WORKSPACE_ROOT, &WorkspaceSection::default()).unwrap();
    assert_eq!(names(&ws), vec!["a", "b", "c"]);
    assert_eq!(
        ws.get("b").unwrap().folder,
        WorkspaceBuilder::folder("b")
    );
}

#[test]
fn list_units_skips_private_and_nameless_manifests() {
    let builder = WorkspaceBuilder::new()
        .unit(ManifestBuilder::new("public"))
        .unit(ManifestBuilder::new("secret").private())
        .unit_in("anonymous", ManifestBuilder::nameless());
    let fs = builder.mock_fs();

    let section = WorkspaceSection::default();
    let units = list_units(&fs, Path::new(WORKSPACE_ROOT), &section).unwrap();
    let found: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(found, vec!["public"]);

    let section = WorkspaceSection {
        include_private: true,
        ..WorkspaceSection::default()
    };
    let units = list_units(&fs, Path::new(WORKSPACE_ROOT), &section).unwrap();
    let found: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(found, vec!["public", "secret"]);
}

#[test]
fn malformed_manifest_is_a_manifest_error() {
    let fs = MockFileSystem::new();
    fs.add_file("/ws/packages/broken/package.json", "{ \"name\": ");

    let err = list_units(&fs, Path::new(WORKSPACE_ROOT), &WorkspaceSection::default()).unwrap_err();
    match err {
        MonorunError::Manifest { path, .. } => {
            assert_eq!(path, Path::new("/ws/packages/broken/package.json"));
        }
        other => panic!("expected manifest error, got {other:?}"),
    }
}

#[test]
fn folder_without_manifest_is_a_manifest_error() {
    let fs = MockFileSystem::new();
    fs.add_dir("/ws/packages/empty");

    let err = list_units(&fs, Path::new(WORKSPACE_ROOT), &WorkspaceSection::default()).unwrap_err();
    assert!(matches!(err, MonorunError::Manifest { .. }));
}

#[test]
fn missing_packages_folder_yields_empty_workspace() {
    let fs = MockFileSystem::new();
    fs.add_dir(WORKSPACE_ROOT);

    let ws = Workspace::load(&fs, WORKSPACE_ROOT, &WorkspaceSection::default()).unwrap();
    assert!(ws.is_empty());
}

#[test]
fn recursive_patterns_find_nested_units_and_skip_node_modules() {
    let fs = MockFileSystem::new();
    fs.add_file("/ws/apps/web/package.json", ManifestBuilder::new("web").to_json());
    fs.add_file("/ws/libs/ui/button/package.json", ManifestBuilder::new("button").to_json());
    fs.add_file(
        "/ws/libs/node_modules/left-pad/package.json",
        ManifestBuilder::new("left-pad").to_json(),
    );

    let section = WorkspaceSection {
        packages: vec!["apps/*".to_string(), "libs/**/button".to_string()],
        ..WorkspaceSection::default()
    };
    let ws = Workspace::load(&fs, WORKSPACE_ROOT, &section).unwrap();
    assert_eq!(names(&ws), vec!["web", "button"]);
}

#[test]
fn duplicate_unit_names_are_rejected() {
    let fs = WorkspaceBuilder::new()
        .unit_in("one", ManifestBuilder::new("dup"))
        .unit_in("two", ManifestBuilder::new("dup"))
        .mock_fs();

    let err = Workspace::load(&fs, WORKSPACE_ROOT, &WorkspaceSection::default()).unwrap_err();
    assert!(err.to_string().contains("duplicate unit name 'dup'"));
}

#[test]
fn dependencies_only_count_workspace_units() {
    let ws = WorkspaceBuilder::new()
        .unit(ManifestBuilder::new("core"))
        .unit(
            ManifestBuilder::new("app")
                .dep("core")
                .dep("lodash")
                .peer("ui")
                .dev("tooling", "*"),
        )
        .unit(ManifestBuilder::new("ui"))
        .unit(ManifestBuilder::new("tooling"))
        .build();

    let app = ws.get("app").unwrap();
    assert_eq!(ws.dependencies_of(app), vec!["core", "tooling", "ui"]);
}

#[test]
fn direct_dependents_only_follow_plain_dependencies() {
    let ws = WorkspaceBuilder::new()
        .unit(ManifestBuilder::new("core"))
        .unit(ManifestBuilder::new("lib").dep("core"))
        .unit(ManifestBuilder::new("plugin").peer("core"))
        .unit(ManifestBuilder::new("app").dep("lib"))
        .build();

    let core = ws.get("core").unwrap();
    let dependents: Vec<_> = ws
        .direct_dependents_of(core)
        .into_iter()
        .map(|u| u.name.as_str())
        .collect();
    assert_eq!(dependents, vec!["lib"]);
}

#[test]
fn ensure_acyclic_reports_cycles() {
    let ws = WorkspaceBuilder::new()
        .unit(ManifestBuilder::new("a").dep("b"))
        .unit(ManifestBuilder::new("b").dep("a"))
        .build();

    let err = ws.ensure_acyclic().unwrap_err();
    assert!(matches!(err, MonorunError::DependencyCycle(_)));

    let ok = WorkspaceBuilder::new()
        .unit(ManifestBuilder::new("a"))
        .unit(ManifestBuilder::new("b").dep("a"))
        .build();
    ok.ensure_acyclic().unwrap();
}

#[test]
fn real_filesystem_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for (folder, manifest) in [
        ("a", ManifestBuilder::new("a")),
        ("b", ManifestBuilder::new("b").dep("a")),
    ] {
        let path = root.join("packages").join(folder);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("package.json"), manifest.to_json()).unwrap();
    }
    std::fs::create_dir_all(root.join("packages").join("node_modules")).unwrap();

    let ws = Workspace::load(&RealFileSystem, root, &WorkspaceSection::default()).unwrap();
    let mut found = names(&ws);
    found.sort();
    assert_eq!(found, vec!["a", "b"]);
    assert_eq!(ws.root(), root);
}

// src/workspace/discover.rs

//! Unit discovery: glob the configured package patterns, read manifests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobMatcher};
use tracing::debug;

use crate::config::WorkspaceSection;
use crate::errors::{MonorunError, Result};
use crate::fs::FileSystem;
use crate::workspace::manifest::{Manifest, Unit};

/// Depth limit for patterns containing `**`.
const MAX_RECURSIVE_DEPTH: usize = 8;

/// List the workspace units under `root`.
///
/// Every folder matching one of `section.packages` must contain a readable
/// manifest; a missing or malformed one aborts loading. Manifests without a
/// name are skipped, as are private ones unless `section.include_private`.
///
/// Order is pattern order, then the filesystem's listing order, which is not
/// guaranteed to be stable across platforms.
pub fn list_units(
    fs: &dyn FileSystem,
    root: &Path,
    section: &WorkspaceSection,
) -> Result<Vec<Unit>> {
    let folders = candidate_folders(fs, root, &section.packages)?;
    let mut units = Vec::with_capacity(folders.len());

    for folder in folders {
        let manifest_path = folder.join(&section.manifest);
        let contents = fs
            .read_to_string(&manifest_path)
            .map_err(|e| MonorunError::Manifest {
                path: manifest_path.clone(),
                message: e.to_string(),
            })?;
        let manifest = Manifest::from_json(&manifest_path, &contents)?;

        if manifest.private && !section.include_private {
            debug!(folder = %folder.display(), "skipping private unit");
            continue;
        }

        match Unit::from_manifest(folder.clone(), manifest) {
            Some(unit) => units.push(unit),
            None => debug!(folder = %folder.display(), "skipping manifest without a name"),
        }
    }

    debug!(count = units.len(), root = %root.display(), "listed workspace units");
    Ok(units)
}

/// Folders under `root` matching any of `patterns`, without duplicates.
fn candidate_folders(fs: &dyn FileSystem, root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut folders = Vec::new();

    for pattern in patterns {
        let matcher = Glob::new(pattern)
            .with_context(|| format!("invalid package pattern: {pattern}"))?
            .compile_matcher();
        let (base, depth) = split_pattern(pattern);
        let base_dir = root.join(base);

        if !fs.is_dir(&base_dir) {
            debug!(pattern = %pattern, dir = %base_dir.display(), "pattern base is not a directory");
            continue;
        }

        walk(fs, root, &base_dir, depth, &matcher, &mut seen, &mut folders)?;
    }

    Ok(folders)
}

fn walk(
    fs: &dyn FileSystem,
    root: &Path,
    dir: &Path,
    depth_left: usize,
    matcher: &GlobMatcher,
    seen: &mut HashSet<PathBuf>,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    if depth_left == 0 {
        return Ok(());
    }

    for path in fs.read_dir(dir)? {
        if !fs.is_dir(&path) || path.file_name().is_some_and(|n| n == "node_modules") {
            continue;
        }

        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");

        if matcher.is_match(&rel) {
            // Units do not nest, so a match ends the descent.
            if seen.insert(path.clone()) {
                out.push(path);
            }
        } else {
            walk(fs, root, &path, depth_left - 1, matcher, seen, out)?;
        }
    }

    Ok(())
}

/// Split a pattern into its literal leading directory and the number of
/// path components left to match below it.
fn split_pattern(pattern: &str) -> (PathBuf, usize) {
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();
    let literal = components
        .iter()
        .take_while(|c| !c.contains(['*', '?', '[', '{']))
        .count();

    let base: PathBuf = components[..literal].iter().collect();
    let rest = &components[literal..];
    let depth = if rest.contains(&"**") {
        MAX_RECURSIVE_DEPTH
    } else if rest.is_empty() {
        // A fully literal pattern names one folder; match it from its parent.
        return match components.split_last() {
            Some((_, parent)) => (parent.iter().collect(), 1),
            None => (PathBuf::new(), 0),
        };
    } else {
        rest.len()
    };

    (base, depth)
}

// src/workspace/mod.rs

//! Workspace units and the dependency graph between them.
//!
//! - [`manifest`] holds the per-unit manifest model and the merged
//!   dependency set.
//! - [`discover`] finds unit folders under the configured patterns and loads
//!   their manifests.
//! - [`graph`] is the loaded [`Workspace`]: the unit list plus the lookups the
//!   scheduler needs (in-workspace dependencies, direct dependents, cycles).

pub mod discover;
pub mod graph;
pub mod manifest;

pub use discover::list_units;
pub use graph::Workspace;
pub use manifest::{Manifest, Unit};

/// Canonical unit name type used throughout the scheduler.
pub type UnitName = String;

// src/config/mod.rs

//! Configuration loading and validation for monorun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like sane render settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{CONFIG_FILE_NAME, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, RawConfigFile, RenderSection, WorkspaceSection};

// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonorunError {
    #[error("Manifest error in {path:?}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Dependency cycle between workspace units: {0}")]
    DependencyCycle(String),

    #[error("Unknown workspace unit: {0}")]
    UnknownUnit(String),

    #[error("Visiting unit '{unit}' failed: {source}")]
    VisitFailed {
        unit: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "Parallel run failed: {} unit(s) failed ({}), {} skipped ({})",
        failed.len(),
        failed.join(", "),
        skipped.len(),
        skipped.join(", ")
    )]
    ParallelRunFailed {
        failed: Vec<String>,
        skipped: Vec<String>,
    },

    #[error("Script '{script}' in unit '{unit}' exited with code {code}")]
    ScriptFailed {
        unit: String,
        script: String,
        code: i32,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MonorunError>;

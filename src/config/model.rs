// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from `monorun.toml`.
///
/// ```toml
/// [workspace]
/// packages = ["packages/*"]
/// include_private = false
///
/// [render]
/// fps = 30
/// stale_after_ms = 500
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub workspace: WorkspaceSection,

    #[serde(default)]
    pub render: RenderSection,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`)
/// or [`ConfigFile::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    workspace: WorkspaceSection,
    render: RenderSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(workspace: WorkspaceSection, render: RenderSection) -> Self {
        Self { workspace, render }
    }

    pub fn workspace(&self) -> &WorkspaceSection {
        &self.workspace
    }

    pub fn render(&self) -> &RenderSection {
        &self.render
    }
}

/// `[workspace]` section: where units live and which ones count.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceSection {
    /// Glob patterns, relative to the workspace root, matching unit folders.
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,

    /// Include units whose manifest sets `"private": true`.
    #[serde(default)]
    pub include_private: bool,

    /// Manifest file name inside each unit folder.
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

fn default_packages() -> Vec<String> {
    vec!["packages/*".to_string()]
}

fn default_manifest() -> String {
    "package.json".to_string()
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            packages: default_packages(),
            include_private: false,
            manifest: default_manifest(),
        }
    }
}

/// `[render]` section: progress renderer tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderSection {
    /// Interactive redraws per second.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// How long a finished task with nothing interesting stays visible.
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,

    /// How long a finished task holding logs or errors stays visible.
    #[serde(default = "default_stale_interesting_after_ms")]
    pub stale_interesting_after_ms: u64,

    /// Idle period after which the interactive timer stops itself.
    #[serde(default = "default_idle_grace_ms")]
    pub idle_grace_ms: u64,

    /// Terminal width assumed when the real one is unknown.
    #[serde(default = "default_fallback_columns")]
    pub fallback_columns: u16,

    /// Terminal height assumed when the real one is unknown.
    #[serde(default = "default_fallback_rows")]
    pub fallback_rows: u16,
}

fn default_fps() -> u32 {
    30
}

fn default_stale_after_ms() -> u64 {
    500
}

fn default_stale_interesting_after_ms() -> u64 {
    10_000
}

fn default_idle_grace_ms() -> u64 {
    1_500
}

fn default_fallback_columns() -> u16 {
    80
}

fn default_fallback_rows() -> u16 {
    24
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            stale_after_ms: default_stale_after_ms(),
            stale_interesting_after_ms: default_stale_interesting_after_ms(),
            idle_grace_ms: default_idle_grace_ms(),
            fallback_columns: default_fallback_columns(),
            fallback_rows: default_fallback_rows(),
        }
    }
}

impl RenderSection {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }

    pub fn idle_grace(&self) -> Duration {
        Duration::from_millis(self.idle_grace_ms)
    }
}

// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{MonorunError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = MonorunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.workspace, raw.render))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_workspace(cfg)?;
    validate_render(cfg)?;
    Ok(())
}

fn validate_workspace(cfg: &RawConfigFile) -> Result<()> {
    if cfg.workspace.packages.is_empty() {
        return Err(MonorunError::Config(
            "[workspace].packages must list at least one pattern".to_string(),
        ));
    }

    for pattern in cfg.workspace.packages.iter() {
        Glob::new(pattern).map_err(|e| {
            MonorunError::Config(format!(
                "[workspace].packages has invalid pattern '{}': {}",
                pattern, e
            ))
        })?;
    }

    if cfg.workspace.manifest.trim().is_empty() {
        return Err(MonorunError::Config(
            "[workspace].manifest must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_render(cfg: &RawConfigFile) -> Result<()> {
    let render = &cfg.render;

    if render.fps == 0 || render.fps > 120 {
        return Err(MonorunError::Config(format!(
            "[render].fps must be between 1 and 120 (got {})",
            render.fps
        )));
    }

    if render.fallback_columns == 0 || render.fallback_rows == 0 {
        return Err(MonorunError::Config(format!(
            "[render].fallback_columns/fallback_rows must be >= 1 (got {}x{})",
            render.fallback_columns, render.fallback_rows
        )));
    }

    if render.stale_interesting_after_ms < render.stale_after_ms {
        return Err(MonorunError::Config(format!(
            "[render].stale_interesting_after_ms ({}) must not be shorter than stale_after_ms ({})",
            render.stale_interesting_after_ms, render.stale_after_ms
        )));
    }

    Ok(())
}

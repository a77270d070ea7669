// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Name of the optional config file looked up at the workspace root.
pub const CONFIG_FILE_NAME: &str = "monorun.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// Load `monorun.toml` from the workspace root, or fall back to defaults when
/// the file does not exist. A file that exists but fails to parse is an error.
pub fn load_or_default(root: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = root.as_ref().join(CONFIG_FILE_NAME);
    if path.is_file() {
        debug!(path = %path.display(), "loading config file");
        load_and_validate(&path)
    } else {
        debug!(path = %path.display(), "no config file; using defaults");
        Ok(ConfigFile::default())
    }
}

// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a flow file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization (including duration strings); it
/// does **not** perform semantic validation. Use [`load_and_validate`] for
/// that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a flow file from path and validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Names the flow after the file stem when `[flow].name` is missing.
/// - Checks for unknown `after` references, cycles and option misuse.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let mut raw_config = load_from_path(path)?;

    if raw_config.flow.name.is_none() {
        raw_config.flow.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }

    let config = ConfigFile::try_from(raw_config)?;
    debug!(flow = config.name(), tasks = config.task.len(), "loaded flow file");
    Ok(config)
}

/// `Taskflow.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Taskflow.toml")
}

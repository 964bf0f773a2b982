//! Centralized path management for orla data directories.
//!
//! Everything lives under a single home directory:
//!
//! ```text
//! ~/.orla/
//! ├── config.yaml              # user configuration
//! ├── tools/<name>/<version>/  # installed tools
//! └── cache/registry/<key>/    # registry snapshots and working copies
//! ```
//!
//! All functions support environment variable overrides for testing and CI:
//! - `ORLA_HOME` - Override the home directory
//! - `ORLA_CACHE_DIR` - Override the cache directory

use crate::{Error, Result};
use std::path::PathBuf;

/// Name of the directory created under the user's home.
pub const HOME_DIR_NAME: &str = ".orla";

/// Name of the user-level configuration file inside the orla home.
pub const USER_CONFIG_FILE: &str = "config.yaml";

/// Name of the project-level configuration file, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "orla.yaml";

/// Get the orla home directory.
///
/// Resolution order:
/// 1. `ORLA_HOME` environment variable
/// 2. `$HOME/.orla`
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn orla_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("ORLA_HOME")
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| Error::configuration("Could not determine home directory"))?;

    Ok(home.join(HOME_DIR_NAME))
}

/// Get the default directory installed tools are materialized into.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn tools_dir() -> Result<PathBuf> {
    Ok(orla_home()?.join("tools"))
}

/// Get the cache directory.
///
/// Resolution order:
/// 1. `ORLA_CACHE_DIR` environment variable
/// 2. `<orla home>/cache`
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("ORLA_CACHE_DIR")
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    Ok(orla_home()?.join("cache"))
}

/// Get the directory holding cached registry indexes and working copies.
///
/// # Errors
///
/// Returns an error if the cache directory cannot be determined.
pub fn registry_cache_dir() -> Result<PathBuf> {
    Ok(cache_dir()?.join("registry"))
}

/// Get the path of the user configuration file.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn user_config_path() -> Result<PathBuf> {
    Ok(orla_home()?.join(USER_CONFIG_FILE))
}

/// Get the path of the project configuration file in the current directory.
///
/// # Errors
///
/// Returns an error if the working directory cannot be read.
pub fn project_config_path() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| Error::io_no_path(e, "current_dir"))?;
    Ok(cwd.join(PROJECT_CONFIG_FILE))
}

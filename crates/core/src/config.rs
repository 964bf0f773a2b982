//! Layered configuration for orla.
//!
//! Configuration is resolved with the following precedence (highest first):
//!
//! 1. Environment variables (`ORLA_TOOLS_DIR`, `ORLA_REGISTRY_URL`)
//! 2. An explicitly supplied config file, or else the project file
//!    (`./orla.yaml`) layered over the user file (`~/.orla/config.yaml`)
//! 3. Built-in defaults
//!
//! ```yaml
//! tools_dir: ./tools
//! registry_url: https://github.com/dorcha-inc/orla-registry
//! log_level: info
//! log_format: pretty
//! ```
//!
//! A relative `tools_dir` is resolved against the directory of the file that
//! declared it. Keys this crate does not know about (server or agent settings)
//! are ignored.

use crate::{Error, Result, paths};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Registry used when neither configuration nor the caller names one.
pub const DEFAULT_REGISTRY_URL: &str = "https://github.com/dorcha-inc/orla-registry";

/// Log verbosity accepted in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose diagnostics
    Debug,
    /// Informational messages
    Info,
    /// Warnings only
    #[default]
    Warn,
    /// Errors only
    Error,
}

impl LogLevel {
    /// Directive usable in a `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_directive())
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// On-disk shape of a configuration file. Every key is optional so files can
/// be layered.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    tools_dir: Option<PathBuf>,
    registry_url: Option<String>,
    log_level: Option<LogLevel>,
    log_format: Option<LogFormat>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrlaConfig {
    /// Directory installed tools live in (`<tools_dir>/<name>/<version>/`).
    pub tools_dir: PathBuf,
    /// Registry consulted when a command does not name one.
    pub registry_url: String,
    /// Log verbosity.
    pub log_level: LogLevel,
    /// Log line format.
    pub log_format: LogFormat,
}

impl OrlaConfig {
    /// Built-in defaults, rooted at the orla home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn defaults() -> Result<Self> {
        Ok(Self {
            tools_dir: paths::tools_dir()?,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
        })
    }

    /// Load configuration using the standard precedence.
    ///
    /// When `explicit` is given it must exist, and the user and project files
    /// are not consulted.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed,
    /// or if `explicit` does not exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::defaults()?;

        if let Some(path) = explicit {
            if !config.merge_file(path)? {
                return Err(Error::configuration(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        } else {
            config.merge_file(&paths::user_config_path()?)?;
            config.merge_file(&paths::project_config_path()?)?;
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Layer a config file over the current values.
    ///
    /// Returns `false` when the file does not exist.
    fn merge_file(&mut self, path: &Path) -> Result<bool> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(Error::io(e, path, "read")),
        };

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.merge_str(&content, base_dir)
            .map_err(|source| Error::parse(path, source))?;

        debug!(path = %path.display(), "Loaded configuration file");
        Ok(true)
    }

    /// Layer YAML configuration content over the current values.
    ///
    /// Relative `tools_dir` values are joined onto `base_dir`.
    pub fn merge_str(
        &mut self,
        content: &str,
        base_dir: &Path,
    ) -> std::result::Result<(), serde_yaml::Error> {
        // An empty document deserializes to unit, not a mapping.
        if content.trim().is_empty() {
            return Ok(());
        }

        let file: ConfigFile = serde_yaml::from_str(content)?;

        if let Some(dir) = file.tools_dir
            && !dir.as_os_str().is_empty()
        {
            self.tools_dir = if dir.is_absolute() {
                dir
            } else {
                base_dir.join(dir)
            };
        }
        if let Some(url) = file.registry_url
            && !url.is_empty()
        {
            self.registry_url = url;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(format) = file.log_format {
            self.log_format = format;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var("ORLA_TOOLS_DIR")
            && !dir.is_empty()
        {
            self.tools_dir =
                std::path::absolute(&dir).map_err(|e| Error::io(e, &dir, "resolve"))?;
        }
        if let Ok(url) = std::env::var("ORLA_REGISTRY_URL")
            && !url.is_empty()
        {
            self.registry_url = url;
        }
        Ok(())
    }
}

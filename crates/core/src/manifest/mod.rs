//! Tool manifest (`tool.yaml`) types and loading.
//!
//! Every tool repository carries a manifest at its root:
//!
//! ```yaml
//! name: fs
//! version: 0.2.0
//! description: Access the local filesystem
//! entrypoint: bin/fs
//! keywords: [file, read]
//! runtime:
//!   mode: capsule
//!   startup_timeout_ms: 2000
//!   env:
//!     LOG_LEVEL: debug
//!   hot_load:
//!     watch: ["src/**/*.py"]
//! ```
//!
//! [`load_manifest`] only parses. [`validate_manifest`] checks required
//! fields and the entrypoint, and fills runtime defaults in place, so the
//! validated manifest is the authoritative one.

mod shebang;
mod validate;

pub use shebang::{ShebangError, parse_shebang};
pub use validate::validate_manifest;

use crate::{Error, Result, fs::resolve_within};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// File name of the manifest at a tool's root.
pub const MANIFEST_FILE_NAME: &str = "tool.yaml";

/// Startup handshake timeout applied to capsule tools that do not set one.
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 5000;

/// Debounce interval applied to hot-load configs that do not set one.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// A tool's `tool.yaml`.
///
/// Required fields deserialize to empty strings when absent so that a
/// missing field is reported by validation rather than as a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolManifest {
    /// Tool name, also the install directory name.
    #[serde(default)]
    pub name: String,
    /// Semantic version without the `v` prefix.
    #[serde(default)]
    pub version: String,
    /// One-line description.
    #[serde(default)]
    pub description: String,
    /// Executable path relative to the tool root.
    #[serde(default)]
    pub entrypoint: String,
    /// Author name or contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// SPDX license identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Source repository URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Project homepage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Search keywords.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Names of other tools this one expects; recorded, never resolved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Runtime configuration consumed by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeConfig>,
}

impl ToolManifest {
    /// Runtime mode, `simple` when none is configured.
    #[must_use]
    pub fn runtime_mode(&self) -> RuntimeMode {
        self.runtime
            .as_ref()
            .and_then(|r| r.mode.clone())
            .unwrap_or_default()
    }
}

/// How the server runs a tool.
///
/// Unrecognized values are kept so validation can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuntimeMode {
    /// One process per invocation.
    #[default]
    Simple,
    /// Long-lived supervised process.
    Capsule,
    /// Any other value found in a manifest.
    Unknown(String),
}

impl From<String> for RuntimeMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "simple" => Self::Simple,
            "capsule" => Self::Capsule,
            _ => Self::Unknown(value),
        }
    }
}

impl From<RuntimeMode> for String {
    fn from(mode: RuntimeMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => f.write_str("simple"),
            Self::Capsule => f.write_str("capsule"),
            Self::Unknown(other) => f.write_str(other),
        }
    }
}

/// Runtime section of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Execution mode; filled with `simple` by validation when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RuntimeMode>,
    /// Startup handshake timeout for capsule tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_timeout_ms: Option<u64>,
    /// Environment injected into the tool process.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Arguments appended to the entrypoint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// File watching configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_load: Option<HotLoadConfig>,
}

/// Reload strategy when a watched file changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HotLoadMode {
    /// Restart the tool process.
    #[default]
    Restart,
    /// Any other value found in a manifest.
    Unknown(String),
}

impl From<String> for HotLoadMode {
    fn from(value: String) -> Self {
        if value == "restart" {
            Self::Restart
        } else {
            Self::Unknown(value)
        }
    }
}

impl From<HotLoadMode> for String {
    fn from(mode: HotLoadMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for HotLoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restart => f.write_str("restart"),
            Self::Unknown(other) => f.write_str(other),
        }
    }
}

/// Hot-load section of a runtime config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotLoadConfig {
    /// Reload strategy; filled with `restart` by validation when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<HotLoadMode>,
    /// Glob patterns, relative to the tool root, to watch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub watch: Vec<String>,
    /// Minimum interval between reloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
}

/// Parse manifest YAML without touching the filesystem.
///
/// # Errors
///
/// Returns the YAML error if the document is malformed.
pub fn parse_manifest(content: &str) -> std::result::Result<ToolManifest, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Load `tool.yaml` from `tool_dir`.
///
/// The manifest is read strictly from inside `tool_dir`; a manifest that is a
/// symlink pointing elsewhere is rejected.
///
/// # Errors
///
/// Returns an error if the file is missing, escapes `tool_dir`, or does not parse.
pub fn load_manifest(tool_dir: &Path) -> Result<ToolManifest> {
    let path = resolve_within(tool_dir, MANIFEST_FILE_NAME)?;
    let content = std::fs::read_to_string(&path).map_err(|e| Error::io(e, &path, "read"))?;
    parse_manifest(&content).map_err(|e| Error::parse(&path, e))
}

//! Error types for installing and managing tools

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Result type for installer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the installer and the inventory.
///
/// Each stage of an install fails with its own variant so callers can tell a
/// missing tool from a broken clone or an invalid manifest.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Installer or inventory was set up with an unusable configuration
    #[error("Configuration error: {message}")]
    #[diagnostic(code(orla::installer::config))]
    Configuration {
        /// What is wrong
        message: String,
    },

    /// The registry index could not be fetched
    #[error("Failed to fetch registry")]
    #[diagnostic(code(orla::installer::registry_fetch))]
    RegistryFetch {
        /// The underlying registry error
        #[source]
        source: orla_registry::Error,
    },

    /// The registry has no tool with the requested name
    #[error("Tool '{name}' not found in registry{}", suggestion.as_ref().map_or(String::new(), |s| format!(". Did you mean: {s}?")))]
    #[diagnostic(
        code(orla::installer::tool_not_found),
        help("Run 'orla tool search' to list available tools")
    )]
    ToolNotFound {
        /// Requested name
        name: String,
        /// Closest registry name, if one is close enough
        suggestion: Option<String>,
    },

    /// The version constraint could not be resolved to a tag
    #[error("Failed to resolve version for tool '{name}'")]
    #[diagnostic(code(orla::installer::resolution))]
    Resolution {
        /// Tool name
        name: String,
        /// The underlying resolver error
        #[source]
        source: orla_registry::Error,
    },

    /// The tool repository could not be cloned at the resolved tag
    #[error("Failed to clone tool repository {url} at {tag}")]
    #[diagnostic(code(orla::installer::clone))]
    Clone {
        /// Repository URL
        url: String,
        /// Tag that was requested
        tag: String,
        /// The underlying VCS error
        #[source]
        source: orla_vcs::Error,
    },

    /// `tool.yaml` could not be loaded
    #[error("Failed to load tool manifest")]
    #[diagnostic(code(orla::installer::manifest))]
    Manifest {
        /// The underlying core error
        #[source]
        source: orla_core::Error,
    },

    /// `tool.yaml` loaded but did not validate
    #[error("Failed to validate tool manifest")]
    #[diagnostic(code(orla::installer::validation))]
    Validation {
        /// The underlying core error
        #[source]
        source: orla_core::Error,
    },

    /// The release tag and the manifest disagree about the version
    #[error("Git tag '{tag}' does not match tool.yaml version '{version}'")]
    #[diagnostic(
        code(orla::installer::version_mismatch),
        help("Release tags must be 'v' followed by the manifest version, e.g. v{version}")
    )]
    VersionMismatch {
        /// Resolved tag
        tag: String,
        /// Version from `tool.yaml`
        version: String,
    },

    /// The validated tree could not be copied into the tools directory
    #[error("Failed to install tool to {}", path.display())]
    #[diagnostic(code(orla::installer::materialize))]
    Materialize {
        /// Final install directory
        path: Box<Path>,
        /// The underlying core error
        #[source]
        source: orla_core::Error,
    },

    /// A local install path does not exist
    #[error("Local path does not exist: {}", path.display())]
    #[diagnostic(code(orla::installer::local_path))]
    LocalPathNotFound {
        /// Path as resolved
        path: Box<Path>,
    },

    /// A local install path is not a directory
    #[error("Local path must be a directory: {}", path.display())]
    #[diagnostic(
        code(orla::installer::local_path),
        help("Archive installs are not supported; unpack the tool first")
    )]
    LocalPathNotDirectory {
        /// Path as resolved
        path: Box<Path>,
    },

    /// A name or version cannot be used as a single directory component
    #[error("Invalid {kind} '{value}'")]
    #[diagnostic(
        code(orla::installer::invalid_component),
        help("Names and versions must not be empty or contain path separators")
    )]
    InvalidComponent {
        /// "tool name" or "version"
        kind: &'static str,
        /// Offending value
        value: String,
    },

    /// The tool has no directory under the tools directory
    #[error("Tool '{name}' is not installed")]
    #[diagnostic(
        code(orla::installer::not_installed),
        help("Run 'orla tool list' to see installed tools")
    )]
    NotInstalled {
        /// Tool name
        name: String,
    },

    /// The tool directory exists but holds no version with a manifest
    #[error("No valid versions of tool '{name}' found in {}", path.display())]
    #[diagnostic(code(orla::installer::no_versions))]
    NoInstalledVersions {
        /// Tool name
        name: String,
        /// Tool directory that was scanned
        path: Box<Path>,
    },

    /// I/O error with path context
    #[error("I/O {operation} failed: {}", path.display())]
    #[diagnostic(code(orla::installer::io))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path involved
        path: Box<Path>,
        /// Operation that failed
        operation: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(source: std::io::Error, path: impl AsRef<Path>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.as_ref().into(),
            operation: operation.into(),
        }
    }

    /// Whether this error means "the thing asked for does not exist", as
    /// opposed to a transport, validation or filesystem failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ToolNotFound { .. } | Self::NotInstalled { .. } | Self::LocalPathNotFound { .. }
        )
    }
}

//! Error types for orla core operations

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for core operations (configuration, manifests, filesystem)
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error with optional path context
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(orla::core::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "create")
        operation: String,
    },

    /// Configuration could not be resolved
    #[error("Configuration error: {message}")]
    #[diagnostic(code(orla::core::config))]
    Configuration {
        /// Description of the configuration problem
        message: String,
    },

    /// A YAML document could not be parsed
    #[error("Failed to parse {}", path.display())]
    #[diagnostic(code(orla::core::parse))]
    Parse {
        /// File that failed to parse
        path: Box<Path>,
        /// The underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// A tool manifest failed validation
    #[error("Manifest validation failed: {message}")]
    #[diagnostic(code(orla::core::manifest))]
    InvalidManifest {
        /// What was wrong with the manifest
        message: String,
        /// Optional hint for fixing the manifest
        #[help]
        help: Option<String>,
    },

    /// A relative path resolved outside of its root directory
    #[error("Path '{path}' escapes {}", root.display())]
    #[diagnostic(
        code(orla::core::path_escape),
        help("Paths in tool.yaml must be relative and stay inside the tool directory")
    )]
    PathEscape {
        /// The offending relative path
        path: String,
        /// The directory it had to stay within
        root: Box<Path>,
    },

    /// Serialization failed
    #[error("Serialization error: {message}")]
    #[diagnostic(code(orla::core::serialization))]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }

    /// Create a parse error for a YAML file
    #[must_use]
    pub fn parse(path: impl AsRef<Path>, source: serde_yaml::Error) -> Self {
        Self::Parse {
            path: path.as_ref().into(),
            source,
        }
    }

    /// Create a manifest validation error
    #[must_use]
    pub fn invalid_manifest(msg: impl Into<String>) -> Self {
        Self::InvalidManifest {
            message: msg.into(),
            help: None,
        }
    }

    /// Create a manifest validation error with a hint
    #[must_use]
    pub fn invalid_manifest_with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
        Self::InvalidManifest {
            message: msg.into(),
            help: Some(help.into()),
        }
    }

    /// Create a path escape error
    #[must_use]
    pub fn path_escape(path: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self::PathEscape {
            path: path.into(),
            root: root.as_ref().into(),
        }
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Whether the underlying cause is a missing file or directory.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for registry operations

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while fetching, caching or querying a registry
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The registry URL cannot be used as a cache key
    #[error("Invalid registry URL '{url}': {reason}")]
    #[diagnostic(
        code(orla::registry::invalid_url),
        help("Registry URLs need a scheme and a host, e.g. https://github.com/dorcha-inc/orla-registry")
    )]
    InvalidUrl {
        /// URL as given
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// I/O error with optional path context
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(code(orla::registry::io))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed
        operation: String,
    },

    /// The registry repository could not be cloned
    #[error("Failed to clone registry repository {url}")]
    #[diagnostic(code(orla::registry::clone))]
    Clone {
        /// Registry URL
        url: String,
        /// The underlying VCS error
        #[source]
        source: orla_vcs::Error,
    },

    /// `registry.yaml` could not be parsed
    #[error("Failed to parse {}", path.display())]
    #[diagnostic(code(orla::registry::parse))]
    Parse {
        /// File that failed to parse
        path: Box<Path>,
        /// The underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// The index could not be serialized for the local snapshot
    #[error("Failed to serialize registry index")]
    #[diagnostic(code(orla::registry::serialize))]
    Serialization {
        /// The underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// `cache clear` found nothing to clear
    #[error("Cache directory not found: {}", path.display())]
    #[diagnostic(code(orla::registry::cache_not_found))]
    CacheNotFound {
        /// Expected cache directory
        path: Box<Path>,
    },

    /// The cache path exists but is not a directory
    #[error("Cache directory is not a directory: {}", path.display())]
    #[diagnostic(code(orla::registry::cache_not_dir))]
    CacheNotDirectory {
        /// Offending path
        path: Box<Path>,
    },

    /// An explicit version constraint is not a `v`-prefixed tag
    #[error("Tag '{tag}' must start with 'v'")]
    #[diagnostic(
        code(orla::registry::invalid_tag),
        help("Use a tag such as v0.1.0, or 'latest'")
    )]
    InvalidTag {
        /// Constraint as given
        tag: String,
    },

    /// Remote tags of a tool repository could not be listed
    #[error("Failed to list tags for tool '{tool}'")]
    #[diagnostic(code(orla::registry::list_tags))]
    ListTags {
        /// Tool name
        tool: String,
        /// The underlying VCS error
        #[source]
        source: orla_vcs::Error,
    },

    /// The tool repository has no tags at all
    #[error("No tags found in repository for tool '{tool}'")]
    #[diagnostic(code(orla::registry::no_tags))]
    NoTagsFound {
        /// Tool name
        tool: String,
    },

    /// The tool repository has tags, but none of the form `v<semver>`
    #[error("No valid semver tags found for tool '{tool}'")]
    #[diagnostic(
        code(orla::registry::no_semver_tags),
        help("Tags must start with 'v' and follow semver format (e.g., v0.1.0)")
    )]
    NoSemverTags {
        /// Tool name
        tool: String,
    },
}

impl Error {
    /// Create an invalid URL error
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(source: std::io::Error, path: impl AsRef<Path>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a parse error for a registry document
    #[must_use]
    pub fn parse(path: impl AsRef<Path>, source: serde_yaml::Error) -> Self {
        Self::Parse {
            path: path.as_ref().into(),
            source,
        }
    }
}

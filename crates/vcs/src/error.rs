//! Error types for VCS operations.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Result type for VCS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by a [`crate::VcsGateway`].
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The VCS program could not be started.
    #[error("Failed to run {program}")]
    #[diagnostic(
        code(orla::vcs::spawn),
        help("Make sure git is installed and on PATH")
    )]
    Spawn {
        /// Program that failed to start
        program: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The VCS program ran and reported failure.
    #[error("git {operation} failed for {target}{}: {output}", status.map_or(String::new(), |s| format!(" (exit {s})")))]
    #[diagnostic(code(orla::vcs::command))]
    CommandFailed {
        /// Operation name, e.g. "clone"
        operation: String,
        /// URL or working copy the operation targeted
        target: String,
        /// Exit status, if the process exited normally
        status: Option<i32>,
        /// Combined stdout and stderr
        output: String,
    },

    /// Local filesystem work around a VCS operation failed.
    #[error("I/O {operation} failed: {}", path.display())]
    #[diagnostic(code(orla::vcs::io))]
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
    /// Create a command failure error.
    #[must_use]
    pub fn command_failed(
        operation: impl Into<String>,
        target: impl Into<String>,
        status: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            operation: operation.into(),
            target: target.into(),
            status,
            output: output.into(),
        }
    }

    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(source: std::io::Error, path: impl AsRef<Path>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.as_ref().into(),
            operation: operation.into(),
        }
    }

    /// Combined command output, when the failure came from the VCS program.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display() {
        let err = Error::command_failed(
            "clone",
            "https://example.com/repo",
            Some(128),
            "fatal: repository not found",
        );
        assert_eq!(
            err.to_string(),
            "git clone failed for https://example.com/repo (exit 128): fatal: repository not found"
        );
        assert_eq!(err.output(), Some("fatal: repository not found"));
    }

    #[test]
    fn test_command_failed_without_status() {
        let err = Error::command_failed("pull", "/tmp/repo", None, "killed");
        assert_eq!(err.to_string(), "git pull failed for /tmp/repo: killed");
    }
}

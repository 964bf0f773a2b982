//! Version-control gateway for orla.
//!
//! Everything orla does over the network goes through [`VcsGateway`]:
//! - shallow clones of registry and tool repositories
//! - fast-forward pulls of cached registry working copies
//! - remote tag listing without a clone
//!
//! [`GitCli`] is the production implementation. With the `testing` feature a
//! scriptable `FakeGateway` is available so higher layers can be exercised
//! without a network or a git binary.

mod error;
mod git;

#[cfg(any(test, feature = "testing"))]
mod fake;

pub use error::{Error, Result};
pub use git::{GitCli, parse_ls_remote_tags};

#[cfg(any(test, feature = "testing"))]
pub use fake::{FakeGateway, VcsCall};

use std::path::Path;

/// Shell-level version-control operations.
///
/// Implementations must be usable behind `Arc<dyn VcsGateway>`.
pub trait VcsGateway: Send + Sync {
    /// Shallow (depth 1) clone of the default branch of `url` into `target`.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the command output if the clone fails.
    fn clone_repo(&self, url: &str, target: &Path) -> Result<()>;

    /// Shallow clone of `url` checked out at `reference` (a tag or branch).
    ///
    /// # Errors
    ///
    /// Returns an error if the repository or reference cannot be fetched.
    fn clone_at(&self, url: &str, reference: &str, target: &Path) -> Result<()>;

    /// Fast-forward an existing working copy.
    ///
    /// Failure is recoverable: callers typically delete the working copy and
    /// clone again.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull fails.
    fn pull(&self, repo: &Path) -> Result<()>;

    /// Raw, unfiltered tag names of a remote repository.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the command output if the remote cannot be queried.
    fn list_tags(&self, url: &str) -> Result<Vec<String>>;
}

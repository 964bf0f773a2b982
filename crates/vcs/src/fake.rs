//! In-memory [`VcsGateway`] for tests.
//!
//! Repositories are described as lists of `(relative path, content)` files.
//! Cloning materializes them on disk (plus an empty `.git` directory), so the
//! code under test sees a realistic working copy without a network or a git
//! binary. Files whose content starts with `#!` are made executable.

use crate::{Error, Result, VcsGateway};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

type Files = Vec<(String, String)>;

/// A call observed by the [`FakeGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    /// `clone_repo(url, target)`
    Clone {
        /// Repository URL
        url: String,
        /// Destination
        target: PathBuf,
    },
    /// `clone_at(url, reference, target)`
    CloneAt {
        /// Repository URL
        url: String,
        /// Tag or branch
        reference: String,
        /// Destination
        target: PathBuf,
    },
    /// `pull(repo)`
    Pull {
        /// Working copy
        repo: PathBuf,
    },
    /// `list_tags(url)`
    ListTags {
        /// Repository URL
        url: String,
    },
}

#[derive(Debug, Default)]
struct FakeRepo {
    head: Files,
    tags: BTreeMap<String, Files>,
    tag_names: Option<Vec<String>>,
}

#[derive(Debug, Default)]
struct FakeState {
    repos: HashMap<String, FakeRepo>,
    checkouts: HashMap<PathBuf, String>,
    failing_clones: HashSet<String>,
    failing_tag_lists: HashSet<String>,
    fail_pull: bool,
    calls: Vec<VcsCall>,
}

/// Scriptable gateway recording every call it receives.
#[derive(Debug, Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    /// Create a gateway that knows no repositories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register (or replace) the default-branch contents of `url`.
    #[must_use]
    pub fn with_repo(self, url: &str, files: &[(&str, &str)]) -> Self {
        self.set_repo_files(url, files);
        self
    }

    /// Register a tag of `url` with its own contents.
    #[must_use]
    pub fn with_tag(self, url: &str, tag: &str, files: &[(&str, &str)]) -> Self {
        self.add_tag(url, tag, files);
        self
    }

    /// Publish a tag of `url` after construction, as if upstream released.
    pub fn add_tag(&self, url: &str, tag: &str, files: &[(&str, &str)]) {
        self.state()
            .repos
            .entry(url.to_string())
            .or_default()
            .tags
            .insert(tag.to_string(), to_files(files));
    }

    /// Override the raw tag list reported by `list_tags` for `url`.
    #[must_use]
    pub fn with_tag_names(self, url: &str, tags: &[&str]) -> Self {
        self.state().repos.entry(url.to_string()).or_default().tag_names =
            Some(tags.iter().map(|t| (*t).to_string()).collect());
        self
    }

    /// Replace the default-branch contents of `url`, as if upstream changed.
    pub fn set_repo_files(&self, url: &str, files: &[(&str, &str)]) {
        self.state().repos.entry(url.to_string()).or_default().head = to_files(files);
    }

    /// Make every `clone_repo`/`clone_at` of `url` fail.
    pub fn fail_clone(&self, url: &str) {
        self.state().failing_clones.insert(url.to_string());
    }

    /// Make every `list_tags` of `url` fail.
    pub fn fail_list_tags(&self, url: &str) {
        self.state().failing_tag_lists.insert(url.to_string());
    }

    /// Make `pull` fail (or succeed again).
    pub fn set_fail_pull(&self, fail: bool) {
        self.state().fail_pull = fail;
    }

    /// Calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<VcsCall> {
        self.state().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count_calls(&self, pred: impl Fn(&VcsCall) -> bool) -> usize {
        self.state().calls.iter().filter(|c| pred(c)).count()
    }
}

impl VcsGateway for FakeGateway {
    fn clone_repo(&self, url: &str, target: &Path) -> Result<()> {
        let mut state = self.state();
        state.calls.push(VcsCall::Clone {
            url: url.to_string(),
            target: target.to_path_buf(),
        });

        if state.failing_clones.contains(url) {
            return Err(Error::command_failed(
                "clone",
                url,
                Some(128),
                "fatal: unable to access repository",
            ));
        }
        let files = state
            .repos
            .get(url)
            .map(|r| r.head.clone())
            .ok_or_else(|| not_found("clone", url))?;
        state.checkouts.insert(target.to_path_buf(), url.to_string());
        drop(state);

        materialize(target, &files)
    }

    fn clone_at(&self, url: &str, reference: &str, target: &Path) -> Result<()> {
        let mut state = self.state();
        state.calls.push(VcsCall::CloneAt {
            url: url.to_string(),
            reference: reference.to_string(),
            target: target.to_path_buf(),
        });

        if state.failing_clones.contains(url) {
            return Err(Error::command_failed(
                "clone",
                url,
                Some(128),
                "fatal: unable to access repository",
            ));
        }
        let repo = state.repos.get(url).ok_or_else(|| not_found("clone", url))?;
        let files = repo.tags.get(reference).cloned().ok_or_else(|| {
            Error::command_failed(
                "clone",
                url,
                Some(128),
                format!("warning: Remote branch {reference} not found in upstream origin"),
            )
        })?;
        drop(state);

        materialize(target, &files)
    }

    fn pull(&self, repo: &Path) -> Result<()> {
        let mut state = self.state();
        state.calls.push(VcsCall::Pull {
            repo: repo.to_path_buf(),
        });

        let target = repo.display().to_string();
        if state.fail_pull {
            return Err(Error::command_failed(
                "pull",
                target,
                Some(1),
                "fatal: Not possible to fast-forward, aborting.",
            ));
        }
        let files = state
            .checkouts
            .get(repo)
            .and_then(|url| state.repos.get(url))
            .map(|r| r.head.clone())
            .ok_or_else(|| not_found("pull", &target))?;
        drop(state);

        materialize(repo, &files)
    }

    fn list_tags(&self, url: &str) -> Result<Vec<String>> {
        let mut state = self.state();
        state.calls.push(VcsCall::ListTags {
            url: url.to_string(),
        });

        if state.failing_tag_lists.contains(url) {
            return Err(Error::command_failed(
                "ls-remote",
                url,
                Some(128),
                "fatal: could not read from remote repository",
            ));
        }
        let repo = state.repos.get(url).ok_or_else(|| not_found("ls-remote", url))?;
        Ok(repo
            .tag_names
            .clone()
            .unwrap_or_else(|| repo.tags.keys().cloned().collect()))
    }
}

fn to_files(files: &[(&str, &str)]) -> Files {
    files
        .iter()
        .map(|(path, content)| ((*path).to_string(), (*content).to_string()))
        .collect()
}

fn not_found(operation: &str, target: &str) -> Error {
    Error::command_failed(
        operation,
        target,
        Some(128),
        format!("fatal: repository '{target}' not found"),
    )
}

fn materialize(target: &Path, files: &Files) -> Result<()> {
    std::fs::create_dir_all(target.join(".git")).map_err(|e| Error::io(e, target, "create"))?;
    for (relative, content) in files {
        let path = target.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create"))?;
        }
        std::fs::write(&path, content).map_err(|e| Error::io(e, &path, "write"))?;

        #[cfg(unix)]
        if content.starts_with("#!") {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .map_err(|e| Error::io(e, &path, "chmod"))?;
        }
    }
    Ok(())
}

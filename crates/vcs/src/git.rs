//! `git` command-line implementation of [`VcsGateway`].

use crate::{Error, Result, VcsGateway};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, warn};

/// Gateway that shells out to the `git` binary.
///
/// Terminal credential prompts are disabled so an unreachable private
/// repository fails instead of blocking on stdin.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    /// Use `git` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific git executable.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run<I, S>(&self, args: I, cwd: Option<&Path>) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).env("GIT_TERMINAL_PROMPT", "0");
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        cmd.output().map_err(|source| Error::Spawn {
            program: self.program.display().to_string(),
            source,
        })
    }

    fn check(output: &Output, operation: &str, target: &str) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }
        Err(Error::command_failed(
            operation,
            target,
            output.status.code(),
            combined_output(output),
        ))
    }
}

impl VcsGateway for GitCli {
    fn clone_repo(&self, url: &str, target: &Path) -> Result<()> {
        debug!(%url, target = %target.display(), "Cloning repository");
        let output = self.run(
            [
                OsStr::new("clone"),
                OsStr::new("--depth"),
                OsStr::new("1"),
                OsStr::new(url),
                target.as_os_str(),
            ],
            None,
        )?;
        Self::check(&output, "clone", url)
    }

    fn clone_at(&self, url: &str, reference: &str, target: &Path) -> Result<()> {
        debug!(%url, %reference, target = %target.display(), "Cloning repository at ref");
        let output = self.run(
            [
                OsStr::new("clone"),
                OsStr::new("--depth"),
                OsStr::new("1"),
                OsStr::new("--branch"),
                OsStr::new(reference),
                OsStr::new(url),
                target.as_os_str(),
            ],
            None,
        )?;
        if output.status.success() {
            return Ok(());
        }

        let combined = combined_output(&output);
        if !combined.contains("not found") {
            return Err(Error::command_failed(
                "clone",
                url,
                output.status.code(),
                combined,
            ));
        }

        // Some refs cannot be fetched with --branch; fall back to a full clone.
        warn!(%url, %reference, "Shallow clone at ref failed, retrying with full clone");
        if target.exists() {
            std::fs::remove_dir_all(target).map_err(|e| Error::io(e, target, "remove"))?;
        }
        let output = self.run([OsStr::new("clone"), OsStr::new(url), target.as_os_str()], None)?;
        Self::check(&output, "clone", url)?;

        let output = self.run(["checkout", "--quiet", reference], Some(target))?;
        Self::check(&output, "checkout", reference)
    }

    fn pull(&self, repo: &Path) -> Result<()> {
        debug!(repo = %repo.display(), "Pulling repository");
        let output = self.run(["pull", "--ff-only", "--quiet"], Some(repo))?;
        Self::check(&output, "pull", &repo.display().to_string())
    }

    fn list_tags(&self, url: &str) -> Result<Vec<String>> {
        debug!(%url, "Listing remote tags");
        let output = self.run(["ls-remote", "--tags", "--refs", url], None)?;
        Self::check(&output, "ls-remote", url)?;
        Ok(parse_ls_remote_tags(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text.trim().to_string()
}

/// Extract tag names from `git ls-remote --tags --refs` output.
///
/// Each line has the form `<sha>\trefs/tags/<name>`; other lines are ignored.
#[must_use]
pub fn parse_ls_remote_tags(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _sha = fields.next()?;
            fields.next()?.strip_prefix("refs/tags/").map(str::to_string)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ls_remote_tags() {
        let output = "\
1f2e3d4c\trefs/tags/v0.1.0
5a6b7c8d\trefs/tags/v0.2.0-beta

9e8f7a6b\trefs/tags/release/latest
deadbeef\trefs/heads/main
";
        assert_eq!(
            parse_ls_remote_tags(output),
            vec!["v0.1.0", "v0.2.0-beta", "release/latest"]
        );
    }

    #[test]
    fn test_parse_ls_remote_tags_empty() {
        assert!(parse_ls_remote_tags("").is_empty());
        assert!(parse_ls_remote_tags("garbage\n").is_empty());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let git = GitCli::with_program("/nonexistent/orla-git");
        let err = git.list_tags("https://example.com/repo").unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }
}

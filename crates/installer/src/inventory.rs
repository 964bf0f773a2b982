//! Installed tools, discovered by scanning `<tools_dir>/<name>/<version>/`.

use crate::{Error, Result};
use orla_core::{MANIFEST_FILE_NAME, ToolManifest, load_manifest};
use semver::Version;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One installed version of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledToolInfo {
    /// Name from the manifest
    pub name: String,
    /// Version directory name
    pub version: String,
    /// Description from the manifest
    pub description: String,
    /// Version directory
    pub path: PathBuf,
}

/// Manifest of the newest installed version of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    /// Manifest, with `version` taken from the version directory
    #[serde(flatten)]
    pub manifest: ToolManifest,
    /// Version directory
    pub path: PathBuf,
}

/// View of a tools directory.
#[derive(Debug, Clone)]
pub struct Inventory {
    tools_dir: PathBuf,
}

impl Inventory {
    /// Create an inventory over `tools_dir`, which does not need to exist yet.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `tools_dir` is empty or cannot be
    /// made absolute.
    pub fn new(tools_dir: impl AsRef<Path>) -> Result<Self> {
        let tools_dir = tools_dir.as_ref();
        if tools_dir.as_os_str().is_empty() {
            return Err(Error::configuration("tools directory cannot be empty"));
        }
        let tools_dir = std::path::absolute(tools_dir).map_err(|e| {
            Error::configuration(format!(
                "failed to resolve tools directory {}: {e}",
                tools_dir.display()
            ))
        })?;
        Ok(Self { tools_dir })
    }

    /// Absolute tools directory.
    #[must_use]
    pub fn tools_dir(&self) -> &Path {
        &self.tools_dir
    }

    /// `<tools_dir>/<name>`, whether or not it exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidComponent`] for names that are not a single
    /// plain path component.
    pub fn tool_dir(&self, name: &str) -> Result<PathBuf> {
        Ok(self.tools_dir.join(checked_component("tool name", name)?))
    }

    /// `<tools_dir>/<name>`, which must exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInstalled`] if the tool has no directory.
    pub fn installed_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.tool_dir(name)?;
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(Error::NotInstalled {
                name: name.to_string(),
            })
        }
    }

    /// Every installed version, ordered by tool directory then version
    /// directory name.
    ///
    /// Versions without a readable manifest are skipped with a warning. A
    /// missing tools directory means nothing is installed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the tools directory cannot be walked.
    pub fn list_installed(&self) -> Result<Vec<InstalledToolInfo>> {
        if !self.tools_dir.exists() {
            debug!(path = %self.tools_dir.display(), "Tools directory does not exist");
            return Ok(Vec::new());
        }

        let mut tools = Vec::new();
        let walker = WalkDir::new(&self.tools_dir)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map_or_else(|| self.tools_dir.clone(), Path::to_path_buf);
                Error::io(std::io::Error::from(e), path, "walk")
            })?;
            if !entry.file_type().is_dir() || is_hidden(entry.path()) {
                continue;
            }

            let version_dir = entry.path();
            let manifest = match load_manifest(version_dir) {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!(path = %version_dir.display(), error = %e, "Failed to load manifest, skipping");
                    continue;
                }
            };

            tools.push(InstalledToolInfo {
                name: manifest.name,
                version: entry.file_name().to_string_lossy().into_owned(),
                description: manifest.description,
                path: version_dir.to_path_buf(),
            });
        }

        Ok(tools)
    }

    /// Remove every installed version of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInstalled`] if the tool has no directory, or an
    /// I/O error if removal fails.
    pub fn uninstall(&self, name: &str) -> Result<()> {
        let dir = self.installed_dir(name)?;
        std::fs::remove_dir_all(&dir).map_err(|e| Error::io(e, &dir, "remove"))?;
        info!(tool = %name, "Tool uninstalled");
        Ok(())
    }

    /// Manifest of the newest installed version of `name`.
    ///
    /// "Newest" is the semver maximum among version directories that hold a
    /// manifest; directories whose name is not a semver sort below all that are.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInstalled`], [`Error::NoInstalledVersions`] when no
    /// version directory holds a manifest, or [`Error::Manifest`] when the
    /// chosen manifest cannot be loaded.
    pub fn tool_info(&self, name: &str) -> Result<ToolInfo> {
        let dir = self.installed_dir(name)?;
        let (version, path) = latest_version_dir(&dir)?.ok_or_else(|| {
            Error::NoInstalledVersions {
                name: name.to_string(),
                path: dir.as_path().into(),
            }
        })?;

        let mut manifest = load_manifest(&path).map_err(|source| Error::Manifest { source })?;
        manifest.version = version;
        Ok(ToolInfo { manifest, path })
    }
}

/// Newest `(version, dir)` under a tool directory.
fn latest_version_dir(tool_dir: &Path) -> Result<Option<(String, PathBuf)>> {
    let entries = std::fs::read_dir(tool_dir).map_err(|e| Error::io(e, tool_dir, "read"))?;

    let mut best: Option<(Option<Version>, String, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(e, tool_dir, "read"))?;
        let path = entry.path();
        if !path.is_dir() || is_hidden(&path) {
            continue;
        }
        if !path.join(MANIFEST_FILE_NAME).is_file() {
            warn!(path = %path.display(), "No manifest in version directory, skipping");
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let parsed = Version::parse(&name).ok();
        let newer = best
            .as_ref()
            .is_none_or(|(best_version, best_name, _)| (&parsed, &name) > (best_version, best_name));
        if newer {
            best = Some((parsed, name, path));
        }
    }

    Ok(best.map(|(_, name, path)| (name, path)))
}

/// Staging directories and other dot-entries are not installs.
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Check that `value` is usable as exactly one directory name.
pub(crate) fn checked_component<'a>(kind: &'static str, value: &'a str) -> Result<&'a str> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == value && !value.starts_with('.') => Ok(value),
        _ => Err(Error::InvalidComponent {
            kind,
            value: value.to_string(),
        }),
    }
}

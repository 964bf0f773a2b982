//! Install tools from a registry or from a local directory
//!
//! Both flows end the same way: the manifest of the candidate tree is loaded
//! and validated first, then the tree (minus `.git`) is copied into a staging
//! directory next to `<tools_dir>/<name>/<version>/` and renamed into place.
//! Nothing reaches the final directory unless validation passed, and running
//! the same install twice replaces the version directory instead of merging
//! into it.

use crate::inventory::{Inventory, checked_component};
use crate::{Error, Result};
use orla_core::{ProgressSink, ToolManifest, fs::copy_dir, load_manifest, validate_manifest};
use orla_registry::{LATEST, RegistryCache, resolve_version};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directories never copied into an install.
const SKIPPED_DIRS: &[&str] = &[".git"];

/// What an install produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    /// Tool name (registry name, or manifest name for local installs)
    pub name: String,
    /// Installed version, from the manifest
    pub version: String,
    /// Release tag, for registry installs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Final install directory
    pub path: PathBuf,
    /// Number of files copied
    pub files: u64,
}

/// Installs tools into a tools directory.
#[derive(Debug, Clone)]
pub struct Installer {
    inventory: Inventory,
    registry: RegistryCache,
}

impl Installer {
    /// Create an installer writing to `tools_dir` and reading registries
    /// through `registry`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `tools_dir` is empty or cannot be
    /// made absolute.
    pub fn new(tools_dir: impl AsRef<Path>, registry: RegistryCache) -> Result<Self> {
        Ok(Self {
            inventory: Inventory::new(tools_dir)?,
            registry,
        })
    }

    /// Absolute tools directory.
    #[must_use]
    pub fn tools_dir(&self) -> &Path {
        self.inventory.tools_dir()
    }

    /// Inventory over the same tools directory.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Registry cache used for lookups.
    #[must_use]
    pub fn registry(&self) -> &RegistryCache {
        &self.registry
    }

    /// Install `name` from the registry at `registry_url`.
    ///
    /// `constraint` is `"latest"` (or empty) or an explicit `v`-prefixed tag.
    ///
    /// # Errors
    ///
    /// Fails with a distinct variant per stage: [`Error::RegistryFetch`],
    /// [`Error::ToolNotFound`] (with a suggestion when a close name exists),
    /// [`Error::Resolution`], [`Error::Clone`], [`Error::Manifest`],
    /// [`Error::Validation`], [`Error::VersionMismatch`] and
    /// [`Error::Materialize`].
    pub fn install_tool(
        &self,
        registry_url: &str,
        name: &str,
        constraint: &str,
        sink: &dyn ProgressSink,
    ) -> Result<InstallOutcome> {
        checked_component("tool name", name)?;

        sink.message(&format!("Fetching registry {registry_url}..."));
        let index = self
            .registry
            .fetch_registry(registry_url, true)
            .map_err(|source| Error::RegistryFetch { source })?;

        let Some(tool) = index.find_tool(name) else {
            let suggestion = index.suggest_similar(name).map(str::to_string);
            debug!(tool = %name, ?suggestion, "Tool not in registry");
            return Err(Error::ToolNotFound {
                name: name.to_string(),
                suggestion,
            });
        };

        sink.message(&format!("Resolving version for {name}..."));
        let resolved = resolve_version(&**self.registry.gateway(), tool, constraint)
            .map_err(|source| Error::Resolution {
                name: name.to_string(),
                source,
            })?;

        let scratch = tempfile::Builder::new()
            .prefix("orla-install-")
            .tempdir()
            .map_err(|e| Error::io(e, std::env::temp_dir(), "create scratch directory"))?;
        let clone_dir = scratch.path().join("tool");

        sink.message(&format!("Cloning {} at {}...", tool.repository, resolved.tag));
        self.registry
            .gateway()
            .clone_at(&tool.repository, &resolved.tag, &clone_dir)
            .map_err(|source| Error::Clone {
                url: tool.repository.clone(),
                tag: resolved.tag.clone(),
                source,
            })?;

        let manifest = load_and_validate(&clone_dir)?;

        let expected_tag = format!("v{}", manifest.version);
        if resolved.tag != expected_tag {
            return Err(Error::VersionMismatch {
                tag: resolved.tag,
                version: manifest.version,
            });
        }

        let (path, files) = self.materialize(&clone_dir, name, &manifest.version, sink)?;
        info!(
            tool = %name,
            version = %manifest.version,
            tag = %resolved.tag,
            path = %path.display(),
            "Tool installed"
        );

        Ok(InstallOutcome {
            name: name.to_string(),
            version: manifest.version,
            tag: Some(resolved.tag),
            path,
            files,
        })
    }

    /// Install the tool in the local directory `path`.
    ///
    /// Name and version come from the directory's manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocalPathNotFound`] or [`Error::LocalPathNotDirectory`]
    /// for unusable paths, and the manifest and materialize errors of
    /// [`Installer::install_tool`].
    pub fn install_local_tool(&self, path: &Path, sink: &dyn ProgressSink) -> Result<InstallOutcome> {
        let source = std::path::absolute(path).map_err(|e| Error::io(e, path, "resolve"))?;
        match std::fs::metadata(&source) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return Err(Error::LocalPathNotDirectory {
                    path: source.into(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::LocalPathNotFound {
                    path: source.into(),
                });
            }
            Err(e) => return Err(Error::io(e, &source, "stat")),
        }

        sink.message(&format!("Installing from {}...", source.display()));
        let manifest = load_and_validate(&source)?;
        let (install_path, files) =
            self.materialize(&source, &manifest.name, &manifest.version, sink)?;
        info!(
            tool = %manifest.name,
            version = %manifest.version,
            source = %source.display(),
            path = %install_path.display(),
            "Local tool installed"
        );

        Ok(InstallOutcome {
            name: manifest.name,
            version: manifest.version,
            tag: None,
            path: install_path,
            files,
        })
    }

    /// Install the newest release of an already installed tool.
    ///
    /// Older version directories are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInstalled`] if the tool has no directory, otherwise
    /// the errors of [`Installer::install_tool`].
    pub fn update_tool(
        &self,
        registry_url: &str,
        name: &str,
        sink: &dyn ProgressSink,
    ) -> Result<InstallOutcome> {
        self.inventory.installed_dir(name)?;
        self.install_tool(registry_url, name, LATEST, sink)
    }

    fn materialize(
        &self,
        source: &Path,
        name: &str,
        version: &str,
        sink: &dyn ProgressSink,
    ) -> Result<(PathBuf, u64)> {
        let tool_dir = self.inventory.tool_dir(name)?;
        let install_dir = tool_dir.join(checked_component("version", version)?);

        let created_tool_dir = !tool_dir.exists();
        std::fs::create_dir_all(&tool_dir).map_err(|e| Error::io(e, &tool_dir, "create"))?;

        sink.message(&format!("Installing {name} {version} to {}", install_dir.display()));
        let placed = place(source, &tool_dir, &install_dir);

        // No empty tool directory survives a failed first install.
        if placed.is_err()
            && created_tool_dir
            && let Err(e) = std::fs::remove_dir_all(&tool_dir)
        {
            warn!(path = %tool_dir.display(), error = %e, "Failed to remove tool directory");
        }

        placed.map(|files| (install_dir, files))
    }
}

/// Copy `source` into a staging directory inside `tool_dir`, then swap it in
/// as `install_dir`.
fn place(source: &Path, tool_dir: &Path, install_dir: &Path) -> Result<u64> {
    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(tool_dir)
        .map_err(|e| Error::io(e, tool_dir, "create staging directory"))?;

    let files = copy_dir(source, staging.path(), SKIPPED_DIRS).map_err(|source| {
        Error::Materialize {
            path: install_dir.into(),
            source,
        }
    })?;

    if install_dir.exists() {
        debug!(path = %install_dir.display(), "Replacing existing install");
        std::fs::remove_dir_all(install_dir).map_err(|e| Error::io(e, install_dir, "remove"))?;
    }
    std::fs::rename(staging.path(), install_dir)
        .map_err(|e| Error::io(e, install_dir, "rename"))?;

    Ok(files)
}

fn load_and_validate(dir: &Path) -> Result<ToolManifest> {
    let mut manifest = load_manifest(dir).map_err(|source| Error::Manifest { source })?;
    validate_manifest(&mut manifest, dir).map_err(|source| Error::Validation { source })?;
    Ok(manifest)
}

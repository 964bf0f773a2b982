//! TTL cache of registry indexes backed by local working copies
//!
//! Each registry URL maps to one cache entry keyed by the SHA-256 of its
//! normalized form:
//!
//! ```text
//! <cache_dir>/
//!   <sha256(url)>/
//!     registry.yaml   snapshot of the last parsed index (mtime = fetch time)
//!     repo/           git working copy of the registry
//! ```
//!
//! A snapshot is served while it is younger than [`CACHE_TTL`]. Otherwise the
//! working copy is pulled (or re-cloned when the pull fails) and the index is
//! parsed again.

use crate::{Error, RegistryIndex, Result};
use orla_vcs::VcsGateway;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};
use url::Url;

/// Name of the index file, both in a registry repository and in the cache.
pub const REGISTRY_FILE_NAME: &str = "registry.yaml";

/// Working copy directory inside a cache entry.
const REPO_DIR_NAME: &str = "repo";

/// How long a cached snapshot stays fresh.
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Compute the cache key for a registry URL.
///
/// The URL is normalized first (lower-case scheme and host, default ports
/// dropped) so equivalent spellings share an entry. The key is the lowercase
/// hex SHA-256 of the normalized URL, 64 characters long.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the URL does not parse or lacks a scheme
/// or host.
pub fn cache_key(registry_url: &str) -> Result<String> {
    let parsed = Url::parse(registry_url)
        .map_err(|e| Error::invalid_url(registry_url, e.to_string()))?;

    if parsed.scheme().is_empty() {
        return Err(Error::invalid_url(registry_url, "URL missing scheme"));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::invalid_url(registry_url, "URL missing host"));
    }

    Ok(hex::encode(Sha256::digest(parsed.as_str().as_bytes())))
}

/// Whether a snapshot last written at `modified` is still fresh at `now`.
///
/// Fresh means strictly younger than [`CACHE_TTL`]. Timestamps in the future
/// count as fresh.
#[must_use]
pub fn is_fresh(modified: SystemTime, now: SystemTime) -> bool {
    now.duration_since(modified)
        .map_or(true, |age| age < CACHE_TTL)
}

/// Registry fetcher with an on-disk TTL cache.
#[derive(Clone)]
pub struct RegistryCache {
    cache_dir: PathBuf,
    gateway: Arc<dyn VcsGateway>,
}

impl std::fmt::Debug for RegistryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCache")
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl RegistryCache {
    /// Create a cache rooted at `cache_dir` using `gateway` for git work.
    pub fn new(cache_dir: impl Into<PathBuf>, gateway: Arc<dyn VcsGateway>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            gateway,
        }
    }

    /// Root of the cache.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Gateway shared with callers that need further git operations.
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn VcsGateway> {
        &self.gateway
    }

    /// Directory of the cache entry for `registry_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for URLs without a scheme or host.
    pub fn entry_dir(&self, registry_url: &str) -> Result<PathBuf> {
        Ok(self.cache_dir.join(cache_key(registry_url)?))
    }

    /// Fetch the index of `registry_url`.
    ///
    /// With `use_cache`, a fresh snapshot is returned without touching git,
    /// and a successful refresh rewrites the snapshot. A snapshot that cannot
    /// be written is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid URL, when the working copy cannot be
    /// cloned, or when the registry's `registry.yaml` cannot be read or parsed.
    pub fn fetch_registry(&self, registry_url: &str, use_cache: bool) -> Result<RegistryIndex> {
        let entry_dir = self.entry_dir(registry_url)?;
        fs::create_dir_all(&self.cache_dir).map_err(|e| Error::io(e, &self.cache_dir, "create"))?;

        let snapshot = entry_dir.join(REGISTRY_FILE_NAME);
        if use_cache {
            if let Some(index) = load_snapshot(&snapshot, SystemTime::now()) {
                debug!(url = %registry_url, path = %snapshot.display(), "Using cached registry");
                return Ok(index);
            }
        }

        let repo_dir = entry_dir.join(REPO_DIR_NAME);
        self.refresh_working_copy(registry_url, &repo_dir)?;

        let index_path = repo_dir.join(REGISTRY_FILE_NAME);
        let content =
            fs::read_to_string(&index_path).map_err(|e| Error::io(e, &index_path, "read"))?;
        let index =
            RegistryIndex::from_yaml(&content).map_err(|e| Error::parse(&index_path, e))?;

        if use_cache {
            if let Err(e) = save_snapshot(&snapshot, &index) {
                warn!(path = %snapshot.display(), error = %e, "Failed to cache registry");
            }
        }

        debug!(
            url = %registry_url,
            tools = index.tools.len(),
            "Fetched registry"
        );
        Ok(index)
    }

    fn refresh_working_copy(&self, registry_url: &str, repo_dir: &Path) -> Result<()> {
        let clone = |reason: &str| {
            debug!(url = %registry_url, path = %repo_dir.display(), reason, "Cloning registry repository");
            self.gateway
                .clone_repo(registry_url, repo_dir)
                .map_err(|source| Error::Clone {
                    url: registry_url.to_string(),
                    source,
                })
        };

        if !repo_dir.exists() {
            return clone("missing");
        }

        debug!(path = %repo_dir.display(), "Updating registry repository");
        match self.gateway.pull(repo_dir) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(path = %repo_dir.display(), error = %e, "Failed to update registry repository, cloning fresh");
                fs::remove_dir_all(repo_dir).map_err(|e| Error::io(e, repo_dir, "remove"))?;
                clone("pull failed")
            }
        }
    }

    /// Remove the whole cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheNotFound`] if the directory does not exist,
    /// [`Error::CacheNotDirectory`] if the path is not a directory, or an I/O
    /// error if removal fails.
    pub fn clear(&self) -> Result<()> {
        let metadata = match fs::metadata(&self.cache_dir) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::CacheNotFound {
                    path: self.cache_dir.as_path().into(),
                });
            }
            Err(e) => return Err(Error::io(e, &self.cache_dir, "stat")),
        };
        if !metadata.is_dir() {
            return Err(Error::CacheNotDirectory {
                path: self.cache_dir.as_path().into(),
            });
        }

        fs::remove_dir_all(&self.cache_dir).map_err(|e| Error::io(e, &self.cache_dir, "remove"))?;
        debug!(path = %self.cache_dir.display(), "Cleared registry cache");
        Ok(())
    }
}

/// Read a snapshot if it exists, is fresh at `now`, and parses. Anything else
/// is a cache miss.
fn load_snapshot(path: &Path, now: SystemTime) -> Option<RegistryIndex> {
    let modified = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No cached registry");
            return None;
        }
    };
    if !is_fresh(modified, now) {
        debug!(path = %path.display(), "Cached registry expired");
        return None;
    }

    let content = fs::read_to_string(path)
        .inspect_err(|e| debug!(path = %path.display(), error = %e, "Failed to read cached registry"))
        .ok()?;
    RegistryIndex::from_yaml(&content)
        .inspect_err(|e| debug!(path = %path.display(), error = %e, "Failed to parse cached registry"))
        .ok()
}

/// Write a snapshot through a temporary file so readers never see a partial
/// document.
fn save_snapshot(path: &Path, index: &RegistryIndex) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create"))?;
    }
    let data = serde_yaml::to_string(index).map_err(|source| Error::Serialization { source })?;

    let tmp_path = path.with_extension("yaml.tmp");
    let mut file = fs::File::create(&tmp_path).map_err(|e| Error::io(e, &tmp_path, "create"))?;
    file.write_all(data.as_bytes())
        .map_err(|e| Error::io(e, &tmp_path, "write"))?;
    file.sync_all().map_err(|e| Error::io(e, &tmp_path, "sync"))?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(|e| Error::io(e, path, "rename"))
}

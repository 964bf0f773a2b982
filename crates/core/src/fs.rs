//! Filesystem helpers shared by manifest validation and installation.

use crate::{Error, Result};
use std::ffi::OsStr;
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

/// Resolve `relative` against `root`, refusing anything that would leave `root`.
///
/// Absolute paths and `..` sequences that climb above `root` are rejected
/// lexically. When the target exists it is also canonicalized, so a symlink
/// pointing outside of `root` is rejected too. The target does not have to
/// exist.
///
/// # Errors
///
/// Returns [`Error::PathEscape`] if the path leaves `root`, or an I/O error if
/// `root` cannot be canonicalized.
pub fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf> {
    let rel = Path::new(relative);
    if relative.is_empty() || rel.has_root() {
        return Err(Error::path_escape(relative, root));
    }

    let mut depth: usize = 0;
    for component in rel.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::path_escape(relative, root))?;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::path_escape(relative, root));
            }
        }
    }

    let candidate = root.join(rel);
    if let Ok(resolved) = candidate.canonicalize() {
        let resolved_root = root
            .canonicalize()
            .map_err(|e| Error::io(e, root, "canonicalize"))?;
        if !resolved.starts_with(&resolved_root) {
            return Err(Error::path_escape(relative, root));
        }
    }

    Ok(candidate)
}

/// Whether any executable bit (owner, group, other) is set.
#[cfg(unix)]
#[must_use]
pub fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

/// Whether any executable bit (owner, group, other) is set.
///
/// Non-unix platforms have no executable bit, so every file qualifies.
#[cfg(not(unix))]
#[must_use]
pub fn is_executable(_metadata: &Metadata) -> bool {
    true
}

/// Recursively copy `src` into `dst`, skipping directories named in `skip_dirs`.
///
/// File and directory permissions are preserved. Symlinks are recreated as
/// symlinks on unix.
/// Returns the number of files copied.
///
/// # Errors
///
/// Returns an I/O error if walking, creating, or copying fails.
pub fn copy_dir(src: &Path, dst: &Path, skip_dirs: &[&str]) -> Result<u64> {
    std::fs::create_dir_all(dst).map_err(|e| Error::io(e, dst, "create"))?;

    let walker = WalkDir::new(src)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() > 0
                && entry.file_type().is_dir()
                && skip_dirs.iter().any(|s| entry.file_name() == OsStr::new(s)))
        });

    let mut copied = 0;
    let mut dir_permissions = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.into());
            Error::io(std::io::Error::from(e), path, "walk")
        })?;

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::io(std::io::Error::other(e), entry.path(), "strip_prefix"))?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| Error::io(e, &target, "create"))?;
            let metadata = entry
                .metadata()
                .map_err(|e| Error::io(std::io::Error::from(e), entry.path(), "stat"))?;
            dir_permissions.push((target, metadata.permissions()));
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
            copied += 1;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| Error::io(e, &target, "copy"))?;
            trace!(path = %relative.display(), "Copied file");
            copied += 1;
        }
    }

    // Children first, so a read-only directory is locked only after it is filled.
    for (dir, permissions) in dir_permissions.into_iter().rev() {
        std::fs::set_permissions(&dir, permissions).map_err(|e| Error::io(e, &dir, "chmod"))?;
    }

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(source: &Path, target: &Path) -> Result<()> {
    let link = std::fs::read_link(source).map_err(|e| Error::io(e, source, "read_link"))?;
    std::os::unix::fs::symlink(&link, target).map_err(|e| Error::io(e, target, "symlink"))
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, target: &Path) -> Result<()> {
    std::fs::copy(source, target)
        .map(|_| ())
        .map_err(|e| Error::io(e, target, "copy"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_within_plain_path() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve_within(temp.path(), "bin/run").unwrap();
        assert_eq!(resolved, temp.path().join("bin/run"));
    }

    #[test]
    fn test_resolve_within_allows_inner_parent() {
        let temp = TempDir::new().unwrap();
        assert!(resolve_within(temp.path(), "bin/../run.sh").is_ok());
    }

    #[test]
    fn test_resolve_within_rejects_escape() {
        let temp = TempDir::new().unwrap();
        for bad in ["../outside", "bin/../../outside", "/etc/passwd", ""] {
            let err = resolve_within(temp.path(), bad).unwrap_err();
            assert!(matches!(err, Error::PathEscape { .. }), "{bad} accepted");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_within_rejects_symlink_escape() {
        let outside = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret"), "x").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret"), root.path().join("link"))
            .unwrap();

        let err = resolve_within(root.path(), "link").unwrap_err();
        assert!(matches!(err, Error::PathEscape { .. }));
    }

    #[test]
    fn test_copy_dir_skips_git() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::create_dir_all(src.path().join(".git/objects")).unwrap();
        std::fs::write(src.path().join(".git/HEAD"), "ref").unwrap();
        std::fs::create_dir_all(src.path().join("bin")).unwrap();
        std::fs::write(src.path().join("bin/run"), "#!/bin/sh\n").unwrap();
        std::fs::write(src.path().join("tool.yaml"), "name: demo\n").unwrap();

        let target = dst.path().join("out");
        let copied = copy_dir(src.path(), &target, &[".git"]).unwrap();

        assert_eq!(copied, 2);
        assert!(target.join("bin/run").exists());
        assert!(target.join("tool.yaml").exists());
        assert!(!target.join(".git").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_dir_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let script = src.path().join("run");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        copy_dir(src.path(), dst.path(), &[]).unwrap();

        let meta = std::fs::metadata(dst.path().join("run")).unwrap();
        assert!(is_executable(&meta));
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_dir_preserves_directory_modes() {
        use std::os::unix::fs::PermissionsExt;

        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::create_dir_all(src.path().join("bin")).unwrap();
        std::fs::write(src.path().join("bin/run"), "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(src.path().join("bin"), std::fs::Permissions::from_mode(0o750))
            .unwrap();
        std::fs::set_permissions(src.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

        let target = dst.path().join("out");
        copy_dir(src.path(), &target, &[]).unwrap();

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&target.join("bin")), 0o750);
        assert_eq!(mode(&target), 0o755);
        assert!(target.join("bin/run").is_file());
    }
}

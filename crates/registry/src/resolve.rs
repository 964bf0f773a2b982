//! Resolve version constraints to concrete release tags.

use crate::{Error, Result, ToolEntry};
use orla_vcs::VcsGateway;
use semver::Version;
use serde::Serialize;
use tracing::{debug, trace};

/// Constraint selecting the newest release.
pub const LATEST: &str = "latest";

/// A concrete version chosen for a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    /// Version without the `v` prefix, e.g. `1.2.0`
    pub version: String,
    /// Git tag, always `v` + `version`
    pub tag: String,
}

impl ResolvedVersion {
    fn from_tag(tag: &str) -> Self {
        Self {
            version: tag.strip_prefix('v').unwrap_or(tag).to_string(),
            tag: tag.to_string(),
        }
    }
}

/// Resolve `constraint` for `tool`.
///
/// `"latest"` and the empty string query the tool repository's tags and pick
/// the highest stable `v<semver>` tag, falling back to the highest
/// pre-release when no stable release exists. Any other constraint must be a
/// `v`-prefixed tag and is returned as is; whether the tag exists is only
/// known once it is cloned.
///
/// # Errors
///
/// Returns [`Error::InvalidTag`] for explicit constraints without a `v`,
/// [`Error::ListTags`] when the repository cannot be queried,
/// [`Error::NoTagsFound`] for a repository without tags, and
/// [`Error::NoSemverTags`] when no tag has the `v<semver>` form.
pub fn resolve_version(
    gateway: &dyn VcsGateway,
    tool: &ToolEntry,
    constraint: &str,
) -> Result<ResolvedVersion> {
    if constraint != LATEST && !constraint.is_empty() {
        if !constraint.starts_with('v') {
            return Err(Error::InvalidTag {
                tag: constraint.to_string(),
            });
        }
        return Ok(ResolvedVersion::from_tag(constraint));
    }

    let tags = gateway
        .list_tags(&tool.repository)
        .map_err(|source| Error::ListTags {
            tool: tool.name.clone(),
            source,
        })?;
    if tags.is_empty() {
        return Err(Error::NoTagsFound {
            tool: tool.name.clone(),
        });
    }

    let tag = select_latest(&tags).ok_or_else(|| Error::NoSemverTags {
        tool: tool.name.clone(),
    })?;
    debug!(tool = %tool.name, %tag, candidates = tags.len(), "Resolved latest version");
    Ok(ResolvedVersion::from_tag(tag))
}

/// Highest stable `v<semver>` tag, or the highest pre-release if there are
/// no stable ones. Other tags are ignored.
///
/// Any tag containing `-` counts as a pre-release, including a `-` inside
/// build metadata such as `v1.0.0+build-1`.
#[must_use]
pub fn select_latest(tags: &[String]) -> Option<&str> {
    let mut best_stable: Option<(Version, &str)> = None;
    let mut best_prerelease: Option<(Version, &str)> = None;

    for tag in tags {
        let Some(version) = parse_release_tag(tag) else {
            trace!(%tag, "Ignoring non-semver tag");
            continue;
        };
        let slot = if !tag.contains('-') {
            &mut best_stable
        } else {
            &mut best_prerelease
        };
        if slot.as_ref().is_none_or(|(best, _)| version > *best) {
            *slot = Some((version, tag.as_str()));
        }
    }

    best_stable.or(best_prerelease).map(|(_, tag)| tag)
}

/// Parse a `v<semver>` tag.
#[must_use]
pub fn parse_release_tag(tag: &str) -> Option<Version> {
    Version::parse(tag.strip_prefix('v')?).ok()
}

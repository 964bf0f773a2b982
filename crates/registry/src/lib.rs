//! Registry access for orla
//!
//! A registry is a git repository whose root holds `registry.yaml`, listing
//! the tools it knows about. This crate provides:
//! - [`RegistryIndex`] and [`ToolEntry`], the parsed document
//! - [`RegistryCache`], fetching indexes through a [`orla_vcs::VcsGateway`]
//!   with a one-hour snapshot cache
//! - [`resolve_version`], turning `latest` or `v<semver>` into a release tag
//! - name lookup with "did you mean" suggestions, and substring search

mod error;

pub mod cache;
pub mod index;
pub mod resolve;
mod search;

pub use cache::{CACHE_TTL, REGISTRY_FILE_NAME, RegistryCache, cache_key, is_fresh};
pub use error::{Error, Result};
pub use index::{RegistryIndex, ToolEntry};
pub use resolve::{LATEST, ResolvedVersion, resolve_version, select_latest};

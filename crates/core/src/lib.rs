//! Core types for orla
//!
//! This crate holds what every other orla crate shares:
//! - Error types with diagnostic codes
//! - Home, tools and cache directory resolution
//! - Layered configuration (`~/.orla/config.yaml`, `./orla.yaml`, environment)
//! - The `tool.yaml` manifest model, loader and validator
//! - Progress sinks for user-facing output
//! - Path-confined filesystem helpers

mod error;

pub mod config;
pub mod fs;
pub mod manifest;
pub mod paths;
pub mod progress;

pub use config::{DEFAULT_REGISTRY_URL, LogFormat, LogLevel, OrlaConfig};
pub use error::{Error, Result};
pub use manifest::{
    HotLoadConfig, HotLoadMode, MANIFEST_FILE_NAME, RuntimeConfig, RuntimeMode, ToolManifest,
    load_manifest, validate_manifest,
};
pub use progress::{NullSink, ProgressSink, RecordingSink, WriterSink};

//! Manifest validation and default filling.

use super::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_STARTUP_TIMEOUT_MS, HotLoadMode, RuntimeConfig, RuntimeMode,
    ToolManifest, parse_shebang,
};
use crate::fs::{is_executable, resolve_within};
use crate::{Error, Result};
use globset::Glob;
use std::path::Path;
use tracing::debug;

/// Validate `manifest` against the tool tree at `tool_dir`, filling defaults.
///
/// Checks run in order: required fields, entrypoint presence inside
/// `tool_dir`, runtime mode, hot-load settings. A non-executable entrypoint
/// is accepted on the assumption that it is a script run through its shebang
/// interpreter.
///
/// On success the manifest always carries a runtime section with an explicit
/// mode, capsule tools carry a startup timeout, and hot-load sections carry a
/// mode and debounce interval.
///
/// # Errors
///
/// Returns [`Error::InvalidManifest`] for schema violations,
/// [`Error::PathEscape`] for an entrypoint outside `tool_dir`, or an I/O error
/// if the entrypoint cannot be inspected.
pub fn validate_manifest(manifest: &mut ToolManifest, tool_dir: &Path) -> Result<()> {
    check_required(manifest)?;
    check_entrypoint(manifest, tool_dir)?;

    let runtime = manifest.runtime.get_or_insert_with(RuntimeConfig::default);
    apply_runtime_defaults(runtime, &manifest.name)?;

    Ok(())
}

fn check_required(manifest: &ToolManifest) -> Result<()> {
    let missing: Vec<&str> = [
        ("name", &manifest.name),
        ("version", &manifest.version),
        ("description", &manifest.description),
        ("entrypoint", &manifest.entrypoint),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::invalid_manifest_with_help(
            format!("missing required field(s): {}", missing.join(", ")),
            "tool.yaml must set name, version, description and entrypoint",
        ))
    }
}

fn check_entrypoint(manifest: &ToolManifest, tool_dir: &Path) -> Result<()> {
    let path = resolve_within(tool_dir, &manifest.entrypoint)?;
    let metadata = std::fs::metadata(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::invalid_manifest(format!(
                "entrypoint '{}' does not exist",
                manifest.entrypoint
            ))
        } else {
            Error::io(e, &path, "stat")
        }
    })?;

    if !metadata.is_file() {
        return Err(Error::invalid_manifest(format!(
            "entrypoint '{}' is not a file",
            manifest.entrypoint
        )));
    }

    if !is_executable(&metadata) {
        match parse_shebang(&path) {
            Ok(interpreter) => debug!(
                path = %path.display(),
                %interpreter,
                "Entrypoint is not executable, will run through its interpreter"
            ),
            Err(e) => debug!(
                path = %path.display(),
                error = %e,
                "Entrypoint is not executable and has no shebang, accepting anyway"
            ),
        }
    }

    Ok(())
}

fn apply_runtime_defaults(runtime: &mut RuntimeConfig, tool: &str) -> Result<()> {
    let mode = runtime.mode.get_or_insert(RuntimeMode::Simple);
    match mode {
        RuntimeMode::Simple => {}
        RuntimeMode::Capsule => {
            if matches!(runtime.startup_timeout_ms, None | Some(0)) {
                runtime.startup_timeout_ms = Some(DEFAULT_STARTUP_TIMEOUT_MS);
            }
        }
        RuntimeMode::Unknown(other) => {
            return Err(Error::invalid_manifest_with_help(
                format!("invalid runtime.mode '{other}' for tool '{tool}'"),
                "runtime.mode must be 'simple' or 'capsule'",
            ));
        }
    }

    if let Some(hot_load) = runtime.hot_load.as_mut() {
        if let HotLoadMode::Unknown(other) = hot_load.mode.get_or_insert(HotLoadMode::Restart) {
            return Err(Error::invalid_manifest_with_help(
                format!("invalid runtime.hot_load.mode '{other}' for tool '{tool}'"),
                "runtime.hot_load.mode must be 'restart'",
            ));
        }
        if matches!(hot_load.debounce_ms, None | Some(0)) {
            hot_load.debounce_ms = Some(DEFAULT_DEBOUNCE_MS);
        }
        for pattern in &hot_load.watch {
            Glob::new(pattern).map_err(|e| {
                Error::invalid_manifest(format!(
                    "invalid runtime.hot_load.watch pattern '{pattern}': {e}"
                ))
            })?;
        }
    }

    Ok(())
}

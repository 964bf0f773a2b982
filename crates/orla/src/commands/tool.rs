//! `orla tool ...` commands

use super::{Context, write_json};
use crate::cli::{CliError, InstallArgs, ListArgs, SearchArgs};
use crate::output::{Table, truncate};
use orla_registry::LATEST;
use std::io::Write;

/// Description width in verbose tables.
const TABLE_DESCRIPTION_WIDTH: usize = 60;
/// Description width in the simple search listing.
const LINE_DESCRIPTION_WIDTH: usize = 80;

/// Split `NAME@VERSION`. An explicit `--version` other than "latest" wins
/// over the suffix.
pub fn split_name_version<'a>(
    arg: &'a str,
    version_flag: &'a str,
) -> Result<(&'a str, &'a str), CliError> {
    let Some((name, suffix)) = arg.split_once('@') else {
        return Ok((arg, version_flag));
    };
    if name.is_empty() || suffix.is_empty() {
        return Err(CliError::usage_with_help(
            format!("Invalid tool reference '{arg}'"),
            "Use NAME or NAME@VERSION, e.g. fs@v0.1.0",
        ));
    }
    let version = if version_flag.is_empty() || version_flag == LATEST {
        suffix
    } else {
        version_flag
    };
    Ok((name, version))
}

/// Install from the registry, or from `--local`.
///
/// # Errors
///
/// Returns the installer's error for the failing stage.
pub fn install(ctx: &Context, args: &InstallArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let outcome = if let Some(local) = &args.local {
        ctx.installer().install_local_tool(local, ctx.sink())?
    } else {
        let Some(arg) = args.name.as_deref() else {
            return Err(CliError::usage_with_help(
                "Tool name is required when installing from the registry",
                "Pass a tool name, or --local PATH to install from a directory",
            ));
        };
        let (name, version) = split_name_version(arg, &args.version)?;
        let registry = ctx.registry_url(args.registry.as_deref());
        ctx.installer()
            .install_tool(registry, name, version, ctx.sink())?
    };

    writeln!(out, "Successfully installed {}", outcome.name)?;
    writeln!(out, "Tool is now available. Restart orla server to use it.")?;
    Ok(())
}

/// Remove every installed version of a tool.
///
/// # Errors
///
/// Returns an error if the tool is not installed or removal fails.
pub fn uninstall(ctx: &Context, name: &str, out: &mut dyn Write) -> Result<(), CliError> {
    ctx.installer().inventory().uninstall(name)?;
    writeln!(out, "Successfully uninstalled tool '{name}'")?;
    writeln!(out, "Restart orla server for changes to take effect.")?;
    Ok(())
}

/// Install the newest release of an installed tool.
///
/// # Errors
///
/// Returns an error if the tool is not installed or the install fails.
pub fn update(
    ctx: &Context,
    name: &str,
    registry: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let registry = ctx.registry_url(registry);
    let outcome = ctx.installer().update_tool(registry, name, ctx.sink())?;
    writeln!(
        out,
        "Successfully updated {} to latest version ({})",
        outcome.name, outcome.version
    )?;
    writeln!(out, "Restart orla server to use the updated version.")?;
    Ok(())
}

/// List installed tools as `name (version)` lines, a table, or JSON.
///
/// # Errors
///
/// Returns an error if the tools directory cannot be read.
pub fn list(ctx: &Context, args: &ListArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let tools = ctx.installer().inventory().list_installed()?;

    if args.json {
        return write_json(out, &tools);
    }
    if tools.is_empty() {
        writeln!(out, "No tools installed.")?;
        writeln!(out, "Install tools with: orla tool install TOOL-NAME")?;
        return Ok(());
    }

    if args.verbose {
        let mut table = Table::with_header(&["NAME", "VERSION", "DESCRIPTION"]);
        for tool in &tools {
            table.row(vec![
                tool.name.clone(),
                tool.version.clone(),
                truncate(&tool.description, TABLE_DESCRIPTION_WIDTH),
            ]);
        }
        table.write_to(out)?;
    } else {
        for tool in &tools {
            writeln!(out, "{} ({})", tool.name, tool.version)?;
        }
    }
    Ok(())
}

/// Search the registry.
///
/// # Errors
///
/// Returns an error if the registry cannot be fetched.
pub fn search(ctx: &Context, args: &SearchArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let registry = ctx.registry_url(args.registry.as_deref());
    ctx.sink().message(&format!("Fetching registry {registry}..."));
    let index = ctx.installer().registry().fetch_registry(registry, true)?;
    let results = index.search(&args.query);

    if args.json {
        return write_json(out, &results);
    }
    if results.is_empty() {
        writeln!(out, "No tools found matching '{}'", args.query)?;
        return Ok(());
    }

    if args.verbose {
        let mut table = Table::with_header(&["NAME", "DESCRIPTION"]);
        for tool in &results {
            table.row(vec![
                tool.name.clone(),
                truncate(&tool.description, TABLE_DESCRIPTION_WIDTH),
            ]);
        }
        table.write_to(out)?;
    } else {
        for tool in &results {
            writeln!(
                out,
                "{}: {}",
                tool.name,
                truncate(&tool.description, LINE_DESCRIPTION_WIDTH)
            )?;
        }
    }
    writeln!(out)?;
    writeln!(out, "Install a tool with: orla tool install TOOL-NAME")?;
    Ok(())
}

/// Show the newest installed version's manifest.
///
/// # Errors
///
/// Returns an error if the tool is not installed or its manifest is unreadable.
pub fn info(ctx: &Context, name: &str, json: bool, out: &mut dyn Write) -> Result<(), CliError> {
    let info = ctx.installer().inventory().tool_info(name)?;
    if json {
        return write_json(out, &info);
    }

    let manifest = &info.manifest;
    writeln!(out, "Name:        {}", manifest.name)?;
    writeln!(out, "Version:     {}", manifest.version)?;
    writeln!(out, "Description: {}", manifest.description)?;
    let optional = [
        ("Author:     ", &manifest.author),
        ("License:    ", &manifest.license),
        ("Repository: ", &manifest.repository),
        ("Homepage:   ", &manifest.homepage),
    ];
    for (label, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            writeln!(out, "{label} {value}")?;
        }
    }
    writeln!(out, "Entrypoint:  {}", manifest.entrypoint)?;
    writeln!(out, "Path:        {}", info.path.display())?;

    if !manifest.keywords.is_empty() {
        writeln!(out, "Keywords:    [{}]", manifest.keywords.join(" "))?;
    }
    if !manifest.dependencies.is_empty() {
        writeln!(out, "Dependencies:")?;
        for dep in &manifest.dependencies {
            writeln!(out, "  - {dep}")?;
        }
    }

    if let Some(runtime) = &manifest.runtime {
        writeln!(out, "Runtime Mode: {}", manifest.runtime_mode())?;
        if !runtime.env.is_empty() {
            writeln!(out, "Environment Variables:")?;
            for (key, value) in &runtime.env {
                writeln!(out, "  {key}={value}")?;
            }
        }
        if !runtime.args.is_empty() {
            writeln!(out, "Arguments: [{}]", runtime.args.join(" "))?;
        }
    }
    Ok(())
}

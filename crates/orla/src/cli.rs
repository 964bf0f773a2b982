// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, Report};
use orla_core::LogLevel;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// An operation failed (registry, clone, manifest, filesystem)
pub const EXIT_FAILURE: i32 = 1;
/// Usage or configuration error exit code
pub const EXIT_USAGE: i32 = 2;

/// CLI-specific errors. Library errors pass through with their own
/// diagnostic codes and help text.
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Arguments that clap accepts but that make no sense together
    #[error("{message}")]
    #[diagnostic(code(orla::cli::usage))]
    Usage {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// Configuration, path or manifest error
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] orla_core::Error),

    /// Registry fetch, cache or resolution error
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] orla_registry::Error),

    /// Install, uninstall or inventory error
    #[error(transparent)]
    #[diagnostic(transparent)]
    Installer(#[from] orla_installer::Error),

    /// Writing command output failed
    #[error("Failed to write output")]
    #[diagnostic(code(orla::cli::output))]
    Output {
        /// The underlying I/O error
        #[from]
        source: io::Error,
    },

    /// Encoding JSON output failed
    #[error("Failed to encode JSON output")]
    #[diagnostic(code(orla::cli::json))]
    Json {
        /// The underlying serde error
        #[from]
        source: serde_json::Error,
    },
}

impl CliError {
    /// Create a usage error with help text
    #[must_use]
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Map a CLI error to its exit code.
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Usage { .. }
        | CliError::Core(orla_core::Error::Configuration { .. })
        | CliError::Installer(
            orla_installer::Error::Configuration { .. }
            | orla_installer::Error::InvalidComponent { .. },
        ) => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}

/// Render an error on stderr with miette.
#[allow(clippy::print_stderr)]
pub fn render_error(err: CliError) {
    let report = Report::new(err);
    eprintln!("{report:?}");
    let _ = io::stderr().flush();
}

/// Log verbosity accepted on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    /// Verbose diagnostics
    Debug,
    /// Informational messages
    Info,
    /// Warnings only
    Warn,
    /// Errors only
    Error,
}

impl From<LevelArg> for LogLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Debug => Self::Debug,
            LevelArg::Info => Self::Info,
            LevelArg::Warn => Self::Warn,
            LevelArg::Error => Self::Error,
        }
    }
}

/// orla: install and manage tools from git-hosted registries.
#[derive(Parser, Debug)]
#[command(name = "orla", version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file to use instead of `./orla.yaml` and `~/.orla/config.yaml`.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging verbosity; overrides the configured level.
    #[arg(short = 'L', long, global = true, value_enum)]
    pub level: Option<LevelArg>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install, remove and inspect tools.
    #[command(subcommand)]
    Tool(ToolCommands),

    /// Manage the registry cache.
    #[command(subcommand)]
    Cache(CacheCommands),
}

/// `orla tool ...`
#[derive(Subcommand, Debug)]
pub enum ToolCommands {
    /// Install a tool from the registry or a local directory.
    #[command(after_help = "Examples:
  orla tool install fs
  orla tool install fs@v0.1.0
  orla tool install fs --version latest
  orla tool install --local ./path/to/tool")]
    Install(InstallArgs),

    /// Remove every installed version of a tool.
    Uninstall {
        /// Tool name
        name: String,
    },

    /// Install the newest release of an installed tool.
    Update {
        /// Tool name
        name: String,

        /// Registry URL (default: configured registry)
        #[arg(long)]
        registry: Option<String>,
    },

    /// List installed tools.
    List(ListArgs),

    /// Search the registry by name, description and keywords.
    Search(SearchArgs),

    /// Show the manifest of the newest installed version of a tool.
    Info {
        /// Tool name
        name: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Arguments of `orla tool install`.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Tool name, optionally as NAME@VERSION
    #[arg(required_unless_present = "local")]
    pub name: Option<String>,

    /// "latest" or a release tag such as v0.1.0
    #[arg(long, default_value = orla_registry::LATEST)]
    pub version: String,

    /// Install from a local directory; the name is read from tool.yaml
    #[arg(long, value_name = "PATH", conflicts_with = "name")]
    pub local: Option<PathBuf>,

    /// Registry URL (default: configured registry)
    #[arg(long)]
    pub registry: Option<String>,
}

/// Arguments of `orla tool list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show a table with descriptions
    #[arg(short, long, visible_alias = "table")]
    pub verbose: bool,
}

/// Arguments of `orla tool search`.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Case-insensitive query; empty matches every tool
    #[arg(default_value = "")]
    pub query: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show results as a table
    #[arg(short, long, visible_alias = "table")]
    pub verbose: bool,

    /// Registry URL (default: configured registry)
    #[arg(long)]
    pub registry: Option<String>,
}

/// `orla cache ...`
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Remove cached registry indexes and working copies.
    Clear,
}

/// Parse command line arguments, exiting on `--help` or usage errors.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

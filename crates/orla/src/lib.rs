//! orla command line interface
//!
//! The binary is a thin shell over this library: [`cli`] defines arguments
//! and error rendering, [`commands`] runs them against an
//! [`orla_installer::Installer`], and [`logging`] sets up tracing.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;

pub use cli::{Cli, CliError, EXIT_FAILURE, EXIT_OK, EXIT_USAGE, exit_code_for, render_error};
pub use commands::{Context, execute};

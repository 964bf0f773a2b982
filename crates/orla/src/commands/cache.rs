//! `orla cache ...` commands

use super::Context;
use crate::cli::CliError;
use std::io::Write;

/// Remove the registry cache directory.
///
/// # Errors
///
/// Returns an error if there is no cache to clear or removal fails.
pub fn clear(ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
    ctx.installer().registry().clear()?;
    writeln!(out, "Cache cleared successfully.")?;
    Ok(())
}

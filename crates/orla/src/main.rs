//! orla CLI application

// CLI binary needs to output to stdout/stderr
#![allow(clippy::print_stderr)]

use orla::cli::{self, Cli};
use orla::{CliError, Context, EXIT_OK, exit_code_for, execute, logging, render_error};
use orla_core::{LogLevel, OrlaConfig, WriterSink};
use std::io::Write;

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();
    let code = match run(cli) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            let code = exit_code_for(&err);
            render_error(err);
            code
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = OrlaConfig::load(cli.config.as_deref())?;
    let level = cli.level.map_or(config.log_level, LogLevel::from);
    logging::init_tracing(level, config.log_format);
    tracing::debug!(
        tools_dir = %config.tools_dir.display(),
        registry = %config.registry_url,
        "Configuration loaded"
    );

    let sink = WriterSink::new(std::io::stderr());
    let ctx = Context::new(config, Box::new(sink))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&ctx, cli.command, &mut out)?;
    out.flush()?;
    Ok(())
}

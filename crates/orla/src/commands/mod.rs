//! Command implementations.
//!
//! Every command writes its result to the `out` writer it is handed and
//! reports progress through the context's sink, so the binary can point them
//! at stdout/stderr and tests can capture both.

pub mod cache;
pub mod tool;

use crate::cli::{CacheCommands, CliError, Commands, ToolCommands};
use orla_core::{OrlaConfig, ProgressSink, paths};
use orla_installer::Installer;
use orla_registry::RegistryCache;
use orla_vcs::{GitCli, VcsGateway};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// Everything a command needs: resolved configuration, an installer over
/// the configured tools directory, and a progress sink.
pub struct Context {
    config: OrlaConfig,
    installer: Installer,
    sink: Box<dyn ProgressSink>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("installer", &self.installer)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Build a context that talks to git through the `git` executable and
    /// caches registries under the orla cache directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be determined or the
    /// tools directory is unusable.
    pub fn new(config: OrlaConfig, sink: Box<dyn ProgressSink>) -> Result<Self, CliError> {
        let gateway: Arc<dyn VcsGateway> = Arc::new(GitCli::new());
        let registry = RegistryCache::new(paths::registry_cache_dir()?, gateway);
        let installer = Installer::new(&config.tools_dir, registry)?;
        Ok(Self::with_installer(config, installer, sink))
    }

    /// Build a context around an existing installer.
    #[must_use]
    pub fn with_installer(
        config: OrlaConfig,
        installer: Installer,
        sink: Box<dyn ProgressSink>,
    ) -> Self {
        Self {
            config,
            installer,
            sink,
        }
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &OrlaConfig {
        &self.config
    }

    /// Installer over the configured tools directory.
    #[must_use]
    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    /// Progress sink.
    #[must_use]
    pub fn sink(&self) -> &dyn ProgressSink {
        self.sink.as_ref()
    }

    /// The registry named on the command line, else the configured one.
    #[must_use]
    pub fn registry_url<'a>(&'a self, flag: Option<&'a str>) -> &'a str {
        flag.filter(|url| !url.is_empty())
            .unwrap_or(self.config.registry_url.as_str())
    }
}

/// Run a parsed command.
///
/// # Errors
///
/// Returns the command's error.
pub fn execute(ctx: &Context, command: Commands, out: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Commands::Tool(ToolCommands::Install(args)) => tool::install(ctx, &args, out),
        Commands::Tool(ToolCommands::Uninstall { name }) => tool::uninstall(ctx, &name, out),
        Commands::Tool(ToolCommands::Update { name, registry }) => {
            tool::update(ctx, &name, registry.as_deref(), out)
        }
        Commands::Tool(ToolCommands::List(args)) => tool::list(ctx, &args, out),
        Commands::Tool(ToolCommands::Search(args)) => tool::search(ctx, &args, out),
        Commands::Tool(ToolCommands::Info { name, json }) => tool::info(ctx, &name, json, out),
        Commands::Cache(CacheCommands::Clear) => cache::clear(ctx, out),
    }
}

/// Pretty JSON followed by a newline.
fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

//! Tool installation for orla
//!
//! [`Installer`] drives a full registry install: registry lookup with
//! "did you mean" suggestions, version resolution, a scratch clone, manifest
//! validation and materialization into `<tools_dir>/<name>/<version>/`. It
//! also installs from local directories and updates installed tools.
//!
//! [`Inventory`] reads the tools directory back: listing, uninstalling and
//! reporting the newest installed version of a tool.

mod error;

pub mod install;
pub mod inventory;

pub use error::{Error, Result};
pub use install::{InstallOutcome, Installer};
pub use inventory::{InstalledToolInfo, Inventory, ToolInfo};

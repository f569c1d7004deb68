//! Configuration for chromup.
//!
//! Two files live in the application directory, next to the executable for a
//! portable install (or in `CHROMUP_HOME` when set):
//!
//! | File | Format | Purpose |
//! |------|--------|---------|
//! | `chromup.toml` | TOML | Where snapshots come from and where they are installed |
//! | `settings.ini` | `key=value` | User preferences toggled from the CLI |
//!
//! Both are optional. A missing `chromup.toml` yields [`UpdaterConfig::default`];
//! a missing or unreadable `settings.ini` yields [`Preferences::default`].

mod preferences;
mod snapshot;
mod updater;

pub use preferences::Preferences;
pub use snapshot::SnapshotPlatform;
pub use updater::UpdaterConfig;

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::constants::HOME_ENV;

/// Directory holding the configuration, preferences, log file and (by default)
/// the installation.
///
/// `CHROMUP_HOME` wins; otherwise the directory containing the running executable.
pub fn app_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(HOME_ENV) {
        return Ok(PathBuf::from(dir));
    }

    let exe = std::env::current_exe().context("Failed to get current executable path")?;
    exe.parent()
        .map(PathBuf::from)
        .context("Executable path has no parent directory")
}

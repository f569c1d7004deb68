//! Command-line interface for chromup.
//!
//! # Commands
//!
//! - `check` - Show installed and latest revisions and offer an update (default)
//! - `status` - Show installed and latest revisions only
//! - `update` - Install the latest revision
//! - `reinstall` - Install the latest revision even if it is already installed
//! - `shortcuts` - Recreate the desktop shortcuts
//! - `settings` - Show or change stored preferences
//!
//! # Global Options
//!
//! - `--verbose` / `--quiet` - Console log level
//! - `--no-progress` - Hide progress bars
//! - `--config <PATH>` - Configuration file instead of `chromup.toml`
//! - `--install-dir <PATH>` - Installation directory override
//!
//! # Examples
//!
//! ```bash
//! chromup                       # startup check
//! chromup update --yes          # unattended update
//! chromup reinstall             # fresh copy, profile kept
//! chromup settings --auto-update false
//! ```

pub mod check;
pub mod common;
pub mod render;
pub mod settings;
pub mod shortcuts;
pub mod status;
pub mod update;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use crate::core::UpdateError;
use crate::utils::logging::{Verbosity, init_logging};
use crate::utils::progress::disable_progress;
use common::CommandContext;

#[derive(Parser, Debug)]
#[command(
    name = "chromup",
    about = "Keep a portable Chromium snapshot installation up to date",
    version,
    long_about = "chromup installs the newest Chromium snapshot build into a portable directory, \
                  replacing the previous build while keeping the profile directory untouched."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress bars
    #[arg(long, global = true)]
    no_progress: bool,

    /// Path to chromup.toml
    #[arg(short, long, global = true, env = "CHROMUP_CONFIG_PATH", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Installation directory, relative to the application directory unless absolute
    #[arg(long, global = true, value_name = "PATH")]
    install_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check for a new revision and offer to install it
    Check(check::CheckCommand),

    /// Show installed and latest revision
    Status(status::StatusCommand),

    /// Install the latest revision
    Update(update::UpdateCommand),

    /// Reinstall the latest revision, keeping the profile
    Reinstall(update::ReinstallCommand),

    /// Recreate desktop shortcuts
    Shortcuts(shortcuts::ShortcutsCommand),

    /// Show or change preferences
    Settings(settings::SettingsCommand),
}

impl Cli {
    pub const fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }

    pub async fn execute(self) -> Result<()> {
        if self.no_progress {
            disable_progress();
        }

        let ctx = match CommandContext::load(self.config.as_deref(), self.install_dir.clone()).await {
            Ok(ctx) => {
                init_logging(self.verbosity(), Some(&ctx.log_file));
                ctx
            }
            Err(e) => {
                init_logging(self.verbosity(), None);
                return Err(e);
            }
        };

        let command = self.command.unwrap_or(Commands::Check(check::CheckCommand::default()));
        let result = match command {
            Commands::Check(cmd) => cmd.execute(&ctx).await,
            Commands::Status(cmd) => cmd.execute(&ctx).await,
            Commands::Update(cmd) => cmd.execute(&ctx).await,
            Commands::Reinstall(cmd) => cmd.execute(&ctx).await,
            Commands::Shortcuts(cmd) => cmd.execute(&ctx).await,
            Commands::Settings(cmd) => cmd.execute(&ctx).await,
        };

        // Update failures are already logged by the orchestrator.
        if let Err(e) = &result {
            if e.downcast_ref::<UpdateError>().is_none() {
                error!(error = format!("{e:#}"), "Command failed");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["chromup"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_update_flags() {
        let cli = Cli::try_parse_from(["chromup", "update", "--force", "-y", "--no-progress"]).unwrap();
        match cli.command {
            Some(Commands::Update(cmd)) => {
                assert!(cmd.force);
                assert!(cmd.yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.no_progress);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["chromup", "--verbose", "--quiet", "status"]).is_err());
    }

    #[test]
    fn test_settings_values() {
        let cli =
            Cli::try_parse_from(["chromup", "settings", "--auto-update", "false", "--create-shortcuts", "true"])
                .unwrap();
        match cli.command {
            Some(Commands::Settings(cmd)) => {
                assert_eq!(cmd.auto_update, Some(false));
                assert_eq!(cmd.create_shortcuts, Some(true));
                assert_eq!(cmd.launch_after_update, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["chromup", "status", "--install-dir", "/opt/chromium", "-q"]).unwrap();
        assert_eq!(cli.install_dir, Some(PathBuf::from("/opt/chromium")));
        assert_eq!(cli.verbosity(), Verbosity::Quiet);
    }
}

//! Shared plumbing for command implementations.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{debug, warn};

use crate::config::{self, Preferences, UpdaterConfig};
use crate::constants::SETTINGS_FILE;
use crate::platform::{self, ShortcutWriter};
use crate::update::{Revision, UpdateOrchestrator, UserPrompt};

/// Resolved locations and configuration for one invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub app_dir: PathBuf,
    pub config: UpdaterConfig,
    pub install_dir: PathBuf,
    pub settings_path: PathBuf,
    pub log_file: PathBuf,
}

impl CommandContext {
    /// Locate the application directory and load `chromup.toml`.
    ///
    /// `install_dir` overrides the configured installation directory.
    pub async fn load(config_path: Option<&Path>, install_dir: Option<PathBuf>) -> Result<Self> {
        let app_dir = config::app_dir()?;
        Self::load_in(app_dir, config_path, install_dir).await
    }

    pub async fn load_in(
        app_dir: PathBuf,
        config_path: Option<&Path>,
        install_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let config = UpdaterConfig::load(config_path, &app_dir)
            .await
            .context("Failed to load updater configuration")?;
        let install_dir = match install_dir {
            Some(dir) => app_dir.join(dir),
            None => config.install_dir(&app_dir),
        };
        debug!(app_dir = %app_dir.display(), install_dir = %install_dir.display(), "Resolved paths");

        Ok(Self {
            settings_path: app_dir.join(SETTINGS_FILE),
            log_file: config.log_file(&app_dir),
            install_dir,
            config,
            app_dir,
        })
    }

    pub async fn preferences(&self) -> Preferences {
        Preferences::load(&self.settings_path).await
    }

    /// Browser executable inside the installation directory.
    pub fn executable(&self) -> PathBuf {
        self.install_dir.join(self.config.platform.executable())
    }

    pub fn orchestrator(&self) -> Result<UpdateOrchestrator> {
        Ok(UpdateOrchestrator::new(&self.config, &self.install_dir)?)
    }
}

/// Ask a yes/no question on the terminal. Empty input means yes.
///
/// Without an interactive stdin nothing is asked and the answer is no.
fn confirm(question: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        debug!(question, "Non-interactive stdin; treating as no");
        return Ok(false);
    }

    print!("{} ", format!("{question} [Y/n]:").green());
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().lock().read_line(&mut response)?;
    Ok(parse_answer(&response))
}

/// [`confirm`] for callers running inside the async runtime.
///
/// The terminal read blocks, so on a multi-threaded runtime the worker is
/// handed over with `block_in_place` first.
pub fn confirm_in_runtime(question: &str) -> Result<bool> {
    off_worker(|| confirm(question))
}

fn off_worker<T>(read: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(read)
        }
        _ => read(),
    }
}

fn parse_answer(response: &str) -> bool {
    let response = response.trim().to_lowercase();
    response.is_empty() || response == "y" || response == "yes"
}

/// Prompt used by the update commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt {
    /// `--yes`: answer every question with yes.
    pub assume_yes: bool,
}

impl UserPrompt for TerminalPrompt {
    fn confirm_reinstall(&self, revision: &Revision) -> bool {
        if self.assume_yes {
            return true;
        }
        let question = format!("Revision {revision} is already installed. Reinstall?");
        confirm_in_runtime(&question).unwrap_or_else(|e| {
            warn!(error = %e, "Could not read answer");
            false
        })
    }
}

/// Recreate desktop shortcuts. Returns how many were written.
pub fn create_shortcuts(ctx: &CommandContext, writer: &dyn ShortcutWriter) -> Result<usize> {
    let desktop = platform::desktop_dir().context("Cannot determine the desktop directory")?;
    let specs = platform::standard_shortcuts(
        &ctx.executable(),
        &ctx.app_dir,
        &ctx.install_dir,
        &ctx.config.preserve_dir,
        &desktop,
    );
    let results = platform::create_all(writer, &specs);
    Ok(results.iter().filter(|r| r.is_ok()).count())
}

/// Shortcuts and launch after a successful install. Never fails the command.
pub fn post_install(ctx: &CommandContext, preferences: &Preferences) {
    if preferences.create_shortcuts {
        match create_shortcuts(ctx, platform::native_writer().as_ref()) {
            Ok(count) => debug!(count, "Desktop shortcuts refreshed"),
            Err(e) => warn!(error = %e, "Desktop shortcuts were not created"),
        }
    }

    if preferences.launch_after_update {
        let executable = ctx.executable();
        if executable.exists() {
            if let Err(e) = platform::launch_detached(&executable) {
                warn!(error = %e, "Could not launch the browser");
            }
        } else {
            warn!(path = %executable.display(), "Browser executable missing after install");
        }
    }
}

//! Startup check, the default when no subcommand is given.
//!
//! Shows both revisions and, when automatic updates are enabled and the
//! revisions differ, offers to install the new one.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::warn;

use super::common::{CommandContext, TerminalPrompt, confirm_in_runtime};
use super::update::run_update;
use crate::update::UpdateRequest;

/// Check for a new revision and offer to install it
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct CheckCommand {
    /// Install without asking when a new revision is available
    #[arg(short, long)]
    pub yes: bool,
}

impl CheckCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let preferences = ctx.preferences().await;
        let mut orchestrator = ctx.orchestrator()?;

        orchestrator.refresh_installed().await;
        let latest = match orchestrator.refresh_remote().await {
            Ok(revision) => Some(revision),
            Err(e) => {
                warn!(error = %e, "Could not resolve the latest revision");
                None
            }
        };

        let state = orchestrator.state();
        println!("{:<11} {}", "Installed:".bold(), state.installed);
        println!("{:<11} {}", "Latest:".bold(), state.remote);

        let Some(latest) = latest else {
            return Ok(());
        };
        if !orchestrator.update_available() {
            println!("{}", "Chromium is up to date".green());
            return Ok(());
        }
        if !preferences.auto_update {
            println!("New revision {latest} is available. Run `chromup update` to install it.");
            return Ok(());
        }

        let accepted = self.yes || confirm_in_runtime(&format!("New revision {latest} is available. Update now?"))?;
        if !accepted {
            return Ok(());
        }

        let prompt = TerminalPrompt {
            assume_yes: self.yes,
        };
        run_update(ctx, &preferences, orchestrator, UpdateRequest::default(), &prompt).await?;
        Ok(())
    }
}

//! `chromup status`: installed and latest revision side by side.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::warn;

use super::common::CommandContext;

/// Show the installed and the latest published revision
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct StatusCommand;

impl StatusCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut orchestrator = ctx.orchestrator()?;
        orchestrator.refresh_installed().await;
        if let Err(e) = orchestrator.refresh_remote().await {
            warn!(error = %e, "Could not resolve the latest revision");
        }

        let state = orchestrator.state();
        println!("{:<11} {}", "Installed:".bold(), state.installed);
        println!("{:<11} {}", "Latest:".bold(), state.remote);
        println!("{:<11} {}", "Location:".bold(), ctx.install_dir.display());
        if orchestrator.update_available() {
            println!("{}", "An update is available. Run `chromup update` to install it.".green());
        }
        Ok(())
    }
}

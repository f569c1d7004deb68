//! `chromup update` and `chromup reinstall`.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::warn;

use super::common::{CommandContext, TerminalPrompt, post_install};
use super::render::ProgressRenderer;
use crate::config::Preferences;
use crate::update::{UpdateOrchestrator, UpdateOutcome, UpdateRequest, UserPrompt};

/// Install the latest snapshot build.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct UpdateCommand {
    /// Reinstall even if the latest revision is already installed
    #[arg(short, long)]
    pub force: bool,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Download and install the latest revision again, keeping the profile.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ReinstallCommand {
    /// Answer yes to every confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl ReinstallCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        UpdateCommand {
            force: true,
            yes: self.yes,
        }
        .execute(ctx)
        .await
    }
}

impl UpdateCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let preferences = ctx.preferences().await;
        println!("{}", "Checking for the latest revision...".cyan());
        let orchestrator = ctx.orchestrator()?;
        let prompt = TerminalPrompt {
            assume_yes: self.yes,
        };
        run_update(ctx, &preferences, orchestrator, UpdateRequest { force: self.force }, &prompt)
            .await
            .map(|_| ())
    }
}

/// Drive one orchestrator run with terminal progress, then apply the
/// post-install preferences.
pub async fn run_update(
    ctx: &CommandContext,
    preferences: &Preferences,
    orchestrator: UpdateOrchestrator,
    request: UpdateRequest,
    prompt: &dyn UserPrompt,
) -> Result<UpdateOutcome> {
    // Settings are written back before every run, also creating the file
    // with defaults on first use.
    if let Err(e) = preferences.save(&ctx.settings_path).await {
        warn!(error = %e, "Could not save preferences");
    }

    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
    let renderer = ProgressRenderer::new().spawn(receiver);
    let mut orchestrator = orchestrator.with_events(sender);

    let result = orchestrator.run(request, prompt).await;
    drop(orchestrator);
    if let Err(e) = renderer.await {
        warn!(error = %e, "Progress renderer stopped unexpectedly");
    }

    let outcome = result?;
    match &outcome {
        UpdateOutcome::Installed { revision, .. } => {
            println!("{}", format!("Chromium revision {revision} installed").green().bold());
            post_install(ctx, preferences);
        }
        UpdateOutcome::Declined { revision } => {
            println!("Revision {revision} is already installed; nothing changed");
        }
        UpdateOutcome::Blocked { process } => {
            println!(
                "{}",
                format!("{process} is running. Close it and run the update again.").yellow()
            );
        }
    }
    Ok(outcome)
}

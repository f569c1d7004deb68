//! `chromup settings`: show or change the stored preferences.

use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use colored::Colorize;

use super::common::CommandContext;
use crate::config::Preferences;

/// Show or change preferences stored in settings.ini
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct SettingsCommand {
    /// Launch the browser after a successful update
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub launch_after_update: Option<bool>,

    /// Offer updates when running the startup check
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub auto_update: Option<bool>,

    /// Recreate desktop shortcuts after a successful update
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub create_shortcuts: Option<bool>,
}

impl SettingsCommand {
    fn apply(&self, preferences: &mut Preferences) -> bool {
        let mut changed = false;
        for (value, field) in [
            (self.launch_after_update, &mut preferences.launch_after_update),
            (self.auto_update, &mut preferences.auto_update),
            (self.create_shortcuts, &mut preferences.create_shortcuts),
        ] {
            if let Some(value) = value {
                changed |= *field != value;
                *field = value;
            }
        }
        changed
    }

    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut preferences = ctx.preferences().await;

        if self.apply(&mut preferences) {
            preferences
                .save(&ctx.settings_path)
                .await
                .with_context(|| format!("Failed to save {}", ctx.settings_path.display()))?;
            println!("{}", "Settings saved".green());
        }

        println!("{}", ctx.settings_path.display().to_string().dimmed());
        println!("  launch after update: {}", preferences.launch_after_update);
        println!("  auto update:         {}", preferences.auto_update);
        println!("  create shortcuts:    {}", preferences.create_shortcuts);
        Ok(())
    }
}

//! `chromup shortcuts`: recreate the desktop shortcuts.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, create_shortcuts};
use crate::platform;

/// Recreate the desktop shortcuts for the installed browser
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ShortcutsCommand;

impl ShortcutsCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let executable = ctx.executable();
        if !executable.exists() {
            bail!(
                "Chromium is not installed at {}. Run `chromup update` first.",
                ctx.install_dir.display()
            );
        }

        let created = create_shortcuts(ctx, platform::native_writer().as_ref())?;
        if created == 0 {
            bail!("No desktop shortcut could be created; see the log for details");
        }
        println!("{}", format!("Created {created} desktop shortcut(s)").green());
        Ok(())
    }
}

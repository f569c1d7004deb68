//! User preferences stored in `settings.ini`.
//!
//! ```text
//! launchAfterUpdate=true
//! autoUpdate=true
//! createShortcuts=false
//! ```
//!
//! Lines that do not split into exactly one key and one value are skipped.
//! Values are true only when they read `true` in any letter case.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

const LAUNCH_AFTER_UPDATE: &str = "launchAfterUpdate";
const AUTO_UPDATE: &str = "autoUpdate";
const CREATE_SHORTCUTS: &str = "createShortcuts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    /// Start the browser once an update succeeds.
    pub launch_after_update: bool,
    /// Offer an update when the startup check finds a new revision.
    pub auto_update: bool,
    /// Recreate desktop shortcuts after an update.
    pub create_shortcuts: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            launch_after_update: true,
            auto_update: true,
            create_shortcuts: true,
        }
    }
}

impl Preferences {
    /// Read preferences, falling back to defaults on any problem.
    pub async fn load(path: &Path) -> Self {
        match fs::read_to_string(path).await {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Self {
        let mut prefs = Self::default();

        for line in content.lines() {
            let parts: Vec<&str> = line.split('=').collect();
            let [key, value] = parts.as_slice() else {
                continue;
            };
            let enabled = value.trim().eq_ignore_ascii_case("true");

            match key.trim() {
                LAUNCH_AFTER_UPDATE => prefs.launch_after_update = enabled,
                AUTO_UPDATE => prefs.auto_update = enabled,
                CREATE_SHORTCUTS => prefs.create_shortcuts = enabled,
                _ => {}
            }
        }

        prefs
    }

    pub fn render(&self) -> String {
        format!(
            "{LAUNCH_AFTER_UPDATE}={}\n{AUTO_UPDATE}={}\n{CREATE_SHORTCUTS}={}\n",
            self.launch_after_update, self.auto_update, self.create_shortcuts
        )
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())
            .await
            .with_context(|| format!("Failed to save settings to {}", path.display()))
    }
}

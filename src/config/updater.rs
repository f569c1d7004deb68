//! Updater configuration (`chromup.toml`).
//!
//! # File Format
//!
//! ```toml
//! base_url = "https://commondatastorage.googleapis.com/chromium-browser-snapshots"
//! platform = "win-x64"          # win-x64 | linux-x64 | mac-arm64
//! install_dir = "Chromium Stable x64"  # relative paths resolve against the app dir
//! channel = "Stable"
//! preserve_dir = "profile"
//! connect_timeout_secs = 30
//! stall_timeout_secs = 120      # 0 disables the stall guard
//! log_file = "chromup.log"
//! ```
//!
//! Every key is optional. Unknown keys are rejected so typos surface early.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use super::SnapshotPlatform;
use crate::constants::{
    CONFIG_FILE, CONFIG_PATH_ENV, DEFAULT_BASE_URL, DEFAULT_CHANNEL, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_INSTALL_DIR_NAME, DEFAULT_STALL_TIMEOUT_SECS, LAST_CHANGE_RESOURCE, LOG_FILE,
    PRESERVED_PROFILE_DIR,
};
use crate::update::Revision;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdaterConfig {
    /// Snapshot bucket root; the platform segment is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub platform: SnapshotPlatform,

    /// Installation root. Defaults to `<app dir>/Chromium Stable x64`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,

    /// Channel label written into the revision marker.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Top-level directory that reclaiming never touches.
    #[serde(default = "default_preserve_dir")]
    pub preserve_dir: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum silence during a download before it is abandoned.
    #[serde(default = "default_stall_timeout_secs")]
    pub stall_timeout_secs: u64,

    /// Persistent diagnostic log. Defaults to `<app dir>/chromup.log`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

fn default_preserve_dir() -> String {
    PRESERVED_PROFILE_DIR.to_string()
}

const fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

const fn default_stall_timeout_secs() -> u64 {
    DEFAULT_STALL_TIMEOUT_SECS
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            platform: SnapshotPlatform::default(),
            install_dir: None,
            channel: default_channel(),
            preserve_dir: default_preserve_dir(),
            connect_timeout_secs: default_connect_timeout_secs(),
            stall_timeout_secs: default_stall_timeout_secs(),
            log_file: None,
        }
    }
}

impl UpdaterConfig {
    /// Load from `explicit`, else `CHROMUP_CONFIG_PATH`, else `<app dir>/chromup.toml`.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub async fn load(explicit: Option<&Path>, app_dir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::default_path(app_dir),
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path(app_dir: &Path) -> PathBuf {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => PathBuf::from(path),
            Err(_) => app_dir.join(CONFIG_FILE),
        }
    }

    fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url '{}'", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("base_url must be an http(s) URL, got '{}'", self.base_url);
        }
        if self.preserve_dir.trim().is_empty() {
            anyhow::bail!("preserve_dir must not be empty");
        }
        Ok(())
    }

    /// Effective base URL including the platform segment, without a trailing slash.
    pub fn snapshot_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.platform.url_segment())
    }

    pub fn last_change_url(&self) -> String {
        format!("{}/{}", self.snapshot_url(), LAST_CHANGE_RESOURCE)
    }

    pub fn archive_url(&self, revision: &Revision) -> String {
        format!("{}/{}/{}", self.snapshot_url(), revision, self.platform.archive_name())
    }

    pub fn install_dir(&self, app_dir: &Path) -> PathBuf {
        match &self.install_dir {
            Some(dir) => app_dir.join(dir),
            None => app_dir.join(DEFAULT_INSTALL_DIR_NAME),
        }
    }

    pub fn log_file(&self, app_dir: &Path) -> PathBuf {
        match &self.log_file {
            Some(file) => app_dir.join(file),
            None => app_dir.join(LOG_FILE),
        }
    }

    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// `None` when the stall guard is disabled.
    pub const fn stall_timeout(&self) -> Option<Duration> {
        match self.stall_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

//! chromup - portable Chromium snapshot updater
//!
//! Keeps a portable Chromium installation in sync with the newest build
//! published in the Chromium snapshot bucket. The previous build is replaced
//! in place while the `profile/` directory next to it is left alone, so
//! bookmarks, sessions and extensions survive every update.
//!
//! # Architecture Overview
//!
//! ```text
//! cli ──> update::UpdateOrchestrator ──┬─> RevisionStore         (revision.log)
//!   │                                  ├─> RemoteVersionResolver (LAST_CHANGE)
//!   │                                  ├─> InstallSpaceReclaimer (keeps profile/)
//!   │                                  ├─> Downloader            (streamed archive)
//!   │                                  └─> ArchiveInstaller      (flat extraction)
//!   └──> platform (shortcuts, launch)
//! ```
//!
//! # Core Modules
//!
//! - [`update`] - The update pipeline and its state machine
//! - [`config`] - `chromup.toml`, platform presets and `settings.ini` preferences
//! - [`core`] - Error taxonomy and user-facing error rendering
//! - [`platform`] - Desktop shortcuts and launching the browser
//! - [`cli`] - Command-line interface
//! - [`utils`] - Progress bars and logging setup
//!
//! # Installation Layout
//!
//! ```text
//! <app dir>/
//! ├── chromup(.exe)
//! ├── chromup.toml           optional configuration
//! ├── settings.ini           preferences
//! ├── chromup.log            warnings and failures
//! ├── profile/               "Common Profile" shortcut data
//! └── Chromium Stable x64/
//!     ├── revision.log       1234567|Stable|x64
//!     ├── profile/           never removed
//!     └── chrome.exe, ...    replaced on every update
//! ```
//!
//! # Configuration (chromup.toml)
//!
//! ```toml
//! base_url = "https://commondatastorage.googleapis.com/chromium-browser-snapshots"
//! platform = "win-x64"            # linux-x64, mac-arm64
//! install_dir = "Chromium Stable x64"
//! channel = "Stable"
//! preserve_dir = "profile"
//! connect_timeout_secs = 30
//! stall_timeout_secs = 120        # 0 disables the stall guard
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod platform;
pub mod update;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

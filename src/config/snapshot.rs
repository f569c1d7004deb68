use serde::{Deserialize, Serialize};
use std::fmt;

/// Build flavour published in the snapshot bucket.
///
/// Each variant fixes the URL segment, the archive name, the top-level folder
/// inside the archive, and how the browser executable is found and detected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotPlatform {
    #[default]
    WinX64,
    LinuxX64,
    MacArm64,
}

impl SnapshotPlatform {
    /// Directory under the bucket root, e.g. `Win_x64`.
    pub const fn url_segment(self) -> &'static str {
        match self {
            Self::WinX64 => "Win_x64",
            Self::LinuxX64 => "Linux_x64",
            Self::MacArm64 => "Mac_Arm",
        }
    }

    pub const fn archive_name(self) -> &'static str {
        match self {
            Self::WinX64 => "chrome-win.zip",
            Self::LinuxX64 => "chrome-linux.zip",
            Self::MacArm64 => "chrome-mac.zip",
        }
    }

    /// Top-level folder every archive entry starts with.
    pub const fn archive_prefix(self) -> &'static str {
        match self {
            Self::WinX64 => "chrome-win",
            Self::LinuxX64 => "chrome-linux",
            Self::MacArm64 => "chrome-mac",
        }
    }

    /// Browser executable, relative to the installation root.
    pub const fn executable(self) -> &'static str {
        match self {
            Self::WinX64 => "chrome.exe",
            Self::LinuxX64 => "chrome",
            Self::MacArm64 => "Chromium.app/Contents/MacOS/Chromium",
        }
    }

    /// Process name checked by the running-instance guard.
    pub const fn process_name(self) -> &'static str {
        match self {
            Self::WinX64 | Self::LinuxX64 => "chrome",
            Self::MacArm64 => "Chromium",
        }
    }

    /// Architecture label stored in the revision marker.
    pub const fn architecture(self) -> &'static str {
        match self {
            Self::WinX64 | Self::LinuxX64 => "x64",
            Self::MacArm64 => "arm64",
        }
    }
}

impl fmt::Display for SnapshotPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url_segment())
    }
}

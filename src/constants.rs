//! Global constants used throughout the chromup codebase.
//!
//! Fixed remote endpoint names, on-disk file names, and numeric defaults that
//! are shared by the update pipeline, the configuration layer, and the CLI.

use std::time::Duration;

/// Root of the public Chromium snapshot bucket. The platform segment
/// (e.g. `Win_x64`) is appended to form the effective base URL.
pub const DEFAULT_BASE_URL: &str =
    "https://commondatastorage.googleapis.com/chromium-browser-snapshots";

/// Name of the plain-text resource holding the newest published revision.
pub const LAST_CHANGE_RESOURCE: &str = "LAST_CHANGE";

/// Marker file, relative to the installation root, naming the installed revision.
pub const REVISION_MARKER_FILE: &str = "revision.log";

/// Directory directly under the installation root that is never reclaimed.
pub const PRESERVED_PROFILE_DIR: &str = "profile";

/// Default release channel written into the revision marker.
pub const DEFAULT_CHANNEL: &str = "Stable";

/// Default installation directory name, relative to the application directory.
pub const DEFAULT_INSTALL_DIR_NAME: &str = "Chromium Stable x64";

/// Preferences file, relative to the application directory.
pub const SETTINGS_FILE: &str = "settings.ini";

/// Updater configuration file, relative to the application directory.
pub const CONFIG_FILE: &str = "chromup.toml";

/// Persistent diagnostic log, relative to the application directory.
pub const LOG_FILE: &str = "chromup.log";

/// Size of a single write (and progress report) during a download: 32 KiB.
pub const DOWNLOAD_BUFFER_SIZE: usize = 32 * 1024;

/// Lower bound applied to elapsed time before computing throughput.
pub const MIN_ELAPSED: Duration = Duration::from_millis(1);

/// Default TCP connect timeout for all HTTP requests (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default time a download may go without receiving a single byte (2 minutes).
pub const DEFAULT_STALL_TIMEOUT_SECS: u64 = 120;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("chromup/", env!("CARGO_PKG_VERSION"));

/// Environment variable overriding the application directory.
pub const HOME_ENV: &str = "CHROMUP_HOME";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "CHROMUP_CONFIG_PATH";

/// Environment variable disabling all progress bars when set.
pub const NO_PROGRESS_ENV: &str = "CHROMUP_NO_PROGRESS";

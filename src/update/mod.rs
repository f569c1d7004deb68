//! Snapshot update pipeline.
//!
//! Keeps a portable Chromium installation in sync with the newest snapshot
//! build without touching the user's profile directory.
//!
//! # Components
//!
//! - [`RevisionStore`]: reads and writes `revision.log` under the installation root
//! - [`RemoteVersionResolver`]: fetches the newest revision from `LAST_CHANGE`
//! - [`Downloader`]: streams the archive to disk with throughput and ETA reporting
//! - [`InstallSpaceReclaimer`]: clears the stale installation, keeping `profile/`
//! - [`ArchiveInstaller`]: unpacks the archive flat onto the installation root
//! - [`UpdateOrchestrator`]: sequences all of the above and applies the update policy
//!
//! # Update Flow
//!
//! ```text
//! 1. Resolve versions
//!    ├── Read revision.log (missing or malformed = not installed)
//!    └── GET {base}/{platform}/LAST_CHANGE (failure aborts the run)
//!
//! 2. Policy check
//!    ├── Same revision and not forced: ask before reinstalling
//!    └── Browser running: stop without touching anything
//!
//! 3. Reclaim
//!    └── Remove every top-level entry except profile/
//!
//! 4. Download
//!    └── GET {base}/{platform}/{revision}/{archive} into the installation root
//!
//! 5. Extract
//!    └── Strip the archive's top-level folder, overwrite in place
//!
//! 6. Finalize
//!    ├── Delete the downloaded archive (best effort)
//!    └── Write revision.log (best effort)
//! ```
//!
//! # Failure Model
//!
//! Resolution, download and extraction failures abort the run and are
//! returned as [`UpdateError`](crate::core::UpdateError). There is no rollback:
//! a failure after the reclaim step leaves an incomplete installation that the
//! next successful run replaces. Nothing is retried automatically.
//!
//! Removing individual stale files, deleting the archive and writing the
//! marker are best effort. Their failures are logged and the run continues.
//!
//! Downloads are not verified against any checksum or signature.

pub mod download;
pub mod extract;
pub mod orchestrator;
pub mod process;
pub mod reclaim;
pub mod remote;
pub mod revision;

pub use download::{Downloader, TransferProgress};
pub use extract::{ArchiveInstaller, ExtractionProgress, ExtractionReport};
pub use orchestrator::{
    UpdateEvent, UpdateOrchestrator, UpdateOutcome, UpdatePhase, UpdateRequest, UpdateState,
    UserPrompt, http_client,
};
pub use process::{ProcessProbe, SystemProcessProbe};
pub use reclaim::{InstallSpaceReclaimer, ReclaimReport};
pub use remote::{RemoteState, RemoteVersionResolver};
pub use revision::{InstalledState, Revision, RevisionMarker, RevisionStore};

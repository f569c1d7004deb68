//! Revision identifiers and the installed-revision marker file.
//!
//! A [`Revision`] is an opaque token naming a published snapshot build. The
//! pipeline only ever compares revisions for equality: any remote revision
//! that differs from the installed one counts as an available update.
//!
//! The installed revision lives in `revision.log` directly under the
//! installation root as a single pipe-delimited line:
//!
//! ```text
//! 1234567|Stable|x64
//! ```
//!
//! A missing, unreadable or malformed marker means [`InstalledState::Absent`];
//! reading never fails.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tokio::fs;
use tracing::{debug, warn};

use crate::constants::REVISION_MARKER_FILE;
use crate::core::UpdateError;

/// Opaque identifier of a published build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Revision {
    type Err = UpdateError;

    /// Accepts any non-empty token without whitespace, path separators or `|`.
    /// Surrounding whitespace is trimmed first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = trimmed.is_empty()
            || trimmed.chars().any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '|'));
        if invalid {
            return Err(UpdateError::InvalidRevision {
                value: s.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the installation root says about itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InstalledState {
    /// No prior install completed (or the marker is unusable).
    #[default]
    Absent,
    /// The marker names this revision.
    Installed(Revision),
}

impl InstalledState {
    pub const fn revision(&self) -> Option<&Revision> {
        match self {
            Self::Absent => None,
            Self::Installed(revision) => Some(revision),
        }
    }
}

impl fmt::Display for InstalledState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Not installed"),
            Self::Installed(revision) => write!(f, "{revision}"),
        }
    }
}

/// Parsed content of the marker file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionMarker {
    pub revision: Revision,
    pub channel: String,
    pub architecture: String,
}

impl RevisionMarker {
    pub fn new(
        revision: Revision,
        channel: impl Into<String>,
        architecture: impl Into<String>,
    ) -> Self {
        Self {
            revision,
            channel: channel.into(),
            architecture: architecture.into(),
        }
    }
}

impl FromStr for RevisionMarker {
    type Err = UpdateError;

    /// Parses the first line as `revision|channel[|architecture]`.
    ///
    /// A line without any `|` is rejected even if it looks like a revision.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.lines().next().unwrap_or_default();
        let mut fields = line.split('|');
        let first = fields.next().unwrap_or_default();
        let Some(channel) = fields.next() else {
            return Err(UpdateError::InvalidRevision {
                value: line.to_string(),
            });
        };
        let architecture = fields.next().unwrap_or_default();

        Ok(Self {
            revision: first.parse()?,
            channel: channel.trim().to_string(),
            architecture: architecture.trim().to_string(),
        })
    }
}

impl fmt::Display for RevisionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.revision, self.channel, self.architecture)
    }
}

/// Reads and writes the marker file under an installation root.
#[derive(Debug, Clone)]
pub struct RevisionStore {
    file_name: String,
}

impl Default for RevisionStore {
    fn default() -> Self {
        Self {
            file_name: REVISION_MARKER_FILE.to_string(),
        }
    }
}

impl RevisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker_path(&self, installation_root: &Path) -> PathBuf {
        installation_root.join(&self.file_name)
    }

    /// Determine the installed revision. Never fails.
    pub async fn read(&self, installation_root: &Path) -> InstalledState {
        let path = self.marker_path(installation_root);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No revision marker");
                return InstalledState::Absent;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Read revision marker failed");
                return InstalledState::Absent;
            }
        };

        match content.parse::<RevisionMarker>() {
            Ok(marker) => {
                debug!(revision = %marker.revision, "Installed revision");
                InstalledState::Installed(marker.revision)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring malformed revision marker");
                InstalledState::Absent
            }
        }
    }

    /// Overwrite the marker file.
    ///
    /// Callers treat a failure as non-fatal: the install itself already
    /// completed, only the bookkeeping is stale.
    pub async fn write(
        &self,
        installation_root: &Path,
        marker: &RevisionMarker,
    ) -> Result<(), UpdateError> {
        let path = self.marker_path(installation_root);
        fs::write(&path, marker.to_string())
            .await
            .map_err(|e| UpdateError::file_system("write revision marker", &path, &e))?;
        debug!(path = %path.display(), %marker, "Revision marker written");
        Ok(())
    }
}

//! Resolution of the newest published revision.

use std::fmt;

use tracing::{debug, info};

use super::Revision;
use crate::core::UpdateError;

/// What the remote endpoint says, as last observed.
///
/// Deliberately a different type from [`super::InstalledState`]: an
/// unreachable server must never read as "nothing installed".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RemoteState {
    /// Not yet queried, or the last query failed.
    #[default]
    Unresolved,
    Resolved(Revision),
}

impl RemoteState {
    pub const fn revision(&self) -> Option<&Revision> {
        match self {
            Self::Unresolved => None,
            Self::Resolved(revision) => Some(revision),
        }
    }
}

impl fmt::Display for RemoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => f.write_str("(error)"),
            Self::Resolved(revision) => write!(f, "{revision}"),
        }
    }
}

/// Reads the `LAST_CHANGE` resource of a snapshot location.
#[derive(Debug, Clone)]
pub struct RemoteVersionResolver {
    client: reqwest::Client,
    url: String,
}

impl RemoteVersionResolver {
    /// `url` is the full address of the marker resource, e.g. `.../Win_x64/LAST_CHANGE`.
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Fetch and parse the newest revision with a single GET.
    pub async fn resolve_latest(&self) -> Result<Revision, UpdateError> {
        debug!(url = %self.url, "Resolving latest revision");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| UpdateError::from_reqwest("fetch latest revision", &self.url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpdateError::from_reqwest("read latest revision", &self.url, &e))?;

        let revision: Revision = body.parse().map_err(|_| UpdateError::RevisionUnresolved {
            reason: format!("unexpected response body '{}'", body.trim()),
        })?;

        info!(%revision, "Latest revision resolved");
        Ok(revision)
    }
}

//! Error handling for chromup
//!
//! Two layers, as elsewhere in the codebase:
//! 1. [`UpdateError`] - strongly-typed failures returned by the pipeline components
//!    (revision store, resolver, downloader, reclaimer, installer, orchestrator).
//! 2. [`ErrorContext`] - a wrapper adding a suggestion and details for CLI display.
//!
//! # Error Categories
//!
//! - **Network**: [`UpdateError::Network`], [`UpdateError::HttpStatus`],
//!   [`UpdateError::TransferStalled`], [`UpdateError::RevisionUnresolved`]
//! - **File system**: [`UpdateError::FileSystem`], [`UpdateError::ArchiveLocked`]
//! - **Extraction**: [`UpdateError::Extraction`], [`UpdateError::UnsafeArchiveEntry`]
//! - **Configuration and platform**: [`UpdateError::Config`], [`UpdateError::Shortcut`],
//!   [`UpdateError::Launch`]
//!
//! A declined confirmation or a running browser instance is not an error; the
//! orchestrator reports those as [`crate::update::UpdateOutcome`] values.
//!
//! # Examples
//!
//! ```rust,no_run
//! use chromup::core::{UpdateError, user_friendly_error};
//!
//! let error = UpdateError::HttpStatus {
//!     url: "https://example.com/LAST_CHANGE".to_string(),
//!     status: 404,
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Failures produced by the update pipeline.
///
/// Variants carry plain strings so the error stays `Clone` and can be moved
/// between the worker and foreground contexts without borrowing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// Transport-level failure (DNS, TLS, connection reset, body read).
    #[error("Network error: {operation}: {reason}")]
    Network {
        /// What was being attempted
        operation: String,
        /// Underlying transport message
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// Response status code
        status: u16,
    },

    /// No data arrived within the stall timeout.
    #[error("Download from {url} stalled: no data received for {seconds}s")]
    TransferStalled {
        /// Requested URL
        url: String,
        /// Configured stall timeout
        seconds: u64,
    },

    /// The newest revision could not be determined.
    #[error("Couldn't resolve latest revision: {reason}")]
    RevisionUnresolved {
        /// Why resolution failed
        reason: String,
    },

    /// A string was not a usable revision identifier.
    #[error("Invalid revision identifier: '{value}'")]
    InvalidRevision {
        /// Offending input
        value: String,
    },

    /// Local I/O failure.
    #[error("File system error: {operation} ({path}): {reason}")]
    FileSystem {
        /// What was being attempted
        operation: String,
        /// Path involved
        path: String,
        /// Underlying I/O message
        reason: String,
    },

    /// Another handle holds the lock on the archive file.
    #[error("Archive file is locked by another process: {path}")]
    ArchiveLocked {
        /// Archive path
        path: String,
    },

    /// The archive is malformed or an entry failed to materialize.
    #[error("Failed to extract {archive}: {reason}")]
    Extraction {
        /// Archive path
        archive: String,
        /// What went wrong
        reason: String,
    },

    /// An entry would land outside the installation root.
    #[error("Unsafe archive entry: {entry}")]
    UnsafeArchiveEntry {
        /// Raw entry name
        entry: String,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description
        message: String,
    },

    /// A desktop shortcut could not be created.
    #[error("Failed to create shortcut: {reason}")]
    Shortcut {
        /// Description
        reason: String,
    },

    /// The installed browser could not be started.
    #[error("Failed to launch {path}: {reason}")]
    Launch {
        /// Executable path
        path: String,
        /// Underlying message
        reason: String,
    },

    /// Anything else.
    #[error("{message}")]
    Other {
        /// Description
        message: String,
    },
}

impl UpdateError {
    /// Build a [`UpdateError::FileSystem`] from an I/O error.
    pub fn file_system(operation: impl Into<String>, path: &Path, err: &std::io::Error) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    /// Build a [`UpdateError::Network`] from a reqwest error, keeping status codes apart.
    pub fn from_reqwest(operation: impl Into<String>, url: &str, err: &reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            },
            None => Self::Network {
                operation: operation.into(),
                reason: err.to_string(),
            },
        }
    }

    /// Whether the failure happened while talking to the remote host.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::HttpStatus { .. }
                | Self::TransferStalled { .. }
                | Self::RevisionUnresolved { .. }
        )
    }
}

/// An error plus optional suggestion and details for terminal output.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpdateError,
    /// What the user can do about it
    pub suggestion: Option<String>,
    /// Extra explanation
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: UpdateError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the context to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with an actionable suggestion.
///
/// Walks the error chain looking for an [`UpdateError`] first, then for the
/// foreign error types the pipeline commonly surfaces. Anything unrecognized
/// becomes [`UpdateError::Other`] with the full cause chain in its message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(update_error) = cause.downcast_ref::<UpdateError>() {
            return create_error_context(update_error.clone());
        }
    }

    for cause in error.chain() {
        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            match io_error.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    return ErrorContext::new(UpdateError::FileSystem {
                        operation: "file access".to_string(),
                        path: "unknown".to_string(),
                        reason: io_error.to_string(),
                    })
                    .with_suggestion("Check ownership of the installation directory or run with elevated permissions");
                }
                std::io::ErrorKind::NotFound => {
                    return ErrorContext::new(UpdateError::FileSystem {
                        operation: "file access".to_string(),
                        path: "unknown".to_string(),
                        reason: io_error.to_string(),
                    })
                    .with_suggestion("Check that the file or directory exists and the path is correct");
                }
                _ => {}
            }
        }

        if let Some(toml_error) = cause.downcast_ref::<toml::de::Error>() {
            return ErrorContext::new(UpdateError::Config {
                message: toml_error.to_string(),
            })
            .with_suggestion("Check the TOML syntax of chromup.toml")
            .with_details("Unknown keys and wrong value types are rejected");
        }

        if let Some(http_error) = cause.downcast_ref::<reqwest::Error>() {
            return create_error_context(UpdateError::from_reqwest(
                "HTTP request",
                http_error.url().map(reqwest::Url::as_str).unwrap_or("unknown"),
                http_error,
            ));
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(UpdateError::Other {
        message,
    })
}

fn create_error_context(error: UpdateError) -> ErrorContext {
    match &error {
        UpdateError::Network { .. } => ErrorContext::new(error)
            .with_suggestion("Check your internet connection and proxy settings, then run the update again")
            .with_details("Nothing is retried automatically; a failed run must be started again"),

        UpdateError::HttpStatus { status, .. } => {
            let suggestion = if *status == 404 {
                "The snapshot may not be published for this platform yet. Check `base_url` and `platform` in chromup.toml"
            } else {
                "The snapshot server rejected the request. Try again later"
            };
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        UpdateError::TransferStalled { .. } => ErrorContext::new(error)
            .with_suggestion("Retry on a more stable connection or raise `stall_timeout_secs` in chromup.toml")
            .with_details("The partially downloaded archive is discarded on the next run"),

        UpdateError::RevisionUnresolved { .. } => ErrorContext::new(error)
            .with_suggestion("Check your internet connection; no download is attempted without a known revision"),

        UpdateError::ArchiveLocked { .. } => ErrorContext::new(error)
            .with_suggestion("Another chromup instance may be running. Wait for it to finish"),

        UpdateError::Extraction { .. } | UpdateError::UnsafeArchiveEntry { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Run `chromup reinstall` to download a fresh copy")
                .with_details("The installation directory may be incomplete until a run succeeds")
        }

        UpdateError::FileSystem { .. } => ErrorContext::new(error)
            .with_suggestion("Check permissions on the installation directory and that no file in it is in use"),

        UpdateError::Config { .. } => ErrorContext::new(error)
            .with_suggestion("Fix or remove chromup.toml to fall back to defaults"),

        UpdateError::Shortcut { .. } => ErrorContext::new(error)
            .with_suggestion("Shortcuts can be regenerated later with `chromup shortcuts`"),

        UpdateError::InvalidRevision { .. }
        | UpdateError::Launch { .. }
        | UpdateError::Other { .. } => ErrorContext::new(error),
    }
}

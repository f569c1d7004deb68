//! Clearing a stale installation while keeping the preserved profile subtree.
//!
//! Only the top level of the installation root is enumerated. Files are
//! deleted, directories are removed recursively, and a directory whose name
//! matches the preserved name (ignoring case) is skipped without being
//! descended into. Per-entry failures are recorded and logged but never abort
//! the pass, so one locked file cannot keep the rest of the tree alive.
//!
//! This is blocking filesystem work; async callers run it on a blocking worker.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::PRESERVED_PROFILE_DIR;
use crate::core::UpdateError;

/// A single entry that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclaimFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one reclaim pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    pub removed_files: usize,
    pub removed_dirs: usize,
    pub preserved: Vec<PathBuf>,
    pub failures: Vec<ReclaimFailure>,
}

impl ReclaimReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct InstallSpaceReclaimer {
    preserve: String,
}

impl Default for InstallSpaceReclaimer {
    fn default() -> Self {
        Self::new(PRESERVED_PROFILE_DIR)
    }
}

impl InstallSpaceReclaimer {
    pub fn new(preserve: impl Into<String>) -> Self {
        Self {
            preserve: preserve.into(),
        }
    }

    fn is_preserved(&self, name: &std::ffi::OsStr) -> bool {
        name.to_str().is_some_and(|name| name.eq_ignore_ascii_case(&self.preserve))
    }

    /// Remove every top-level entry of `root` except the preserved directory.
    ///
    /// A missing root yields an empty report. Failing to list the root is an
    /// error; failing to remove an individual entry is not.
    pub fn clear(&self, root: &Path) -> Result<ReclaimReport, UpdateError> {
        self.clear_with(root, |path, is_dir| if is_dir { remove_dir(path) } else { remove_file(path) })
    }

    fn clear_with<F>(&self, root: &Path, mut remove: F) -> Result<ReclaimReport, UpdateError>
    where
        F: FnMut(&Path, bool) -> std::io::Result<()>,
    {
        let mut report = ReclaimReport::default();

        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(root = %root.display(), "Installation root does not exist; nothing to reclaim");
                return Ok(report);
            }
            Err(e) => return Err(UpdateError::file_system("list installation directory", root, &e)),
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "Failed to read directory entry");
                    report.failures.push(ReclaimFailure {
                        path: root.to_path_buf(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let path = entry.path();

            // file_type() does not follow symlinks, so a linked directory is
            // unlinked rather than emptied.
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

            if is_dir && self.is_preserved(&entry.file_name()) {
                debug!(path = %path.display(), "Preserving profile directory");
                report.preserved.push(path);
                continue;
            }

            match remove(&path, is_dir) {
                Ok(()) if is_dir => report.removed_dirs += 1,
                Ok(()) => report.removed_files += 1,
                Err(e) => record_failure(&mut report, path, &e),
            }
        }

        debug!(
            root = %root.display(),
            files = report.removed_files,
            dirs = report.removed_dirs,
            failures = report.failures.len(),
            "Reclaim finished"
        );
        Ok(report)
    }
}

fn record_failure(report: &mut ReclaimReport, path: PathBuf, err: &std::io::Error) {
    warn!(path = %path.display(), error = %err, "Failed to remove stale entry");
    report.failures.push(ReclaimFailure {
        path,
        reason: err.to_string(),
    });
}

fn remove_file(path: &Path) -> std::io::Result<()> {
    clear_readonly(path);
    fs::remove_file(path)
}

fn remove_dir(path: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(first) if first.kind() == std::io::ErrorKind::PermissionDenied => {
            // Read-only files inside the tree block removal on Windows.
            clear_readonly_tree(path);
            fs::remove_dir_all(path)
        }
        Err(e) => Err(e),
    }
}

/// Best-effort: drop the read-only flag so the entry can be deleted.
fn clear_readonly(path: &Path) {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return;
    };
    if metadata.file_type().is_symlink() {
        return;
    }
    let mut permissions = metadata.permissions();
    if !permissions.readonly() {
        return;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        permissions.set_readonly(false);
    }

    if let Err(e) = fs::set_permissions(path, permissions) {
        debug!(path = %path.display(), error = %e, "Could not clear read-only flag");
    }
}

fn clear_readonly_tree(path: &Path) {
    clear_readonly(path);
    let Ok(entries) = fs::read_dir(path) else {
        return;
    };
    for entry in entries.flatten() {
        let child = entry.path();
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            clear_readonly_tree(&child);
        } else {
            clear_readonly(&child);
        }
    }
}

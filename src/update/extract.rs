//! Unpacking a snapshot archive onto a flat installation root.
//!
//! Snapshot archives wrap everything in a single top-level folder
//! (`chrome-win/`, `chrome-linux/`, ...). That folder is stripped from every
//! entry so the build lands directly in the installation root, next to the
//! preserved profile directory. Both `/` and `\` separators are accepted in
//! entry names since Windows-built archives are not always normalised.
//!
//! Entries that land inside the preserved profile directory are skipped, so
//! an archive can never overwrite user data.
//!
//! Any entry-level failure aborts the whole extraction. A partially extracted
//! tree is a failed install, and the caller is expected to say so.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::constants::PRESERVED_PROFILE_DIR;
use crate::core::UpdateError;

/// Per-entry progress of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionProgress {
    pub processed: usize,
    pub total: usize,
}

impl ExtractionProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let processed = self.processed.min(self.total);
        u8::try_from(processed * 100 / self.total).unwrap_or(100)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
    /// Entries skipped because they fall inside the preserved directory.
    pub skipped: usize,
}

/// Where an archive entry lands, relative to the destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryTarget {
    /// The prefix folder itself; maps onto the root.
    Root,
    Directory(PathBuf),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ArchiveInstaller {
    prefix: String,
    preserve: String,
}

impl ArchiveInstaller {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            preserve: PRESERVED_PROFILE_DIR.to_string(),
        }
    }

    /// Top-level directory name (any case) that extraction never writes into.
    pub fn with_preserve(mut self, preserve: impl Into<String>) -> Self {
        self.preserve = preserve.into();
        self
    }

    fn is_preserved(&self, relative: &Path) -> bool {
        match relative.components().next() {
            Some(Component::Normal(first)) => first
                .to_str()
                .is_some_and(|first| first.eq_ignore_ascii_case(&self.preserve)),
            _ => false,
        }
    }

    /// Extract `archive` into `destination`, overwriting existing files.
    ///
    /// Blocking. `on_progress` is called once per entry, after it has been
    /// written, with the running count.
    pub fn extract<F>(
        &self,
        archive: &Path,
        destination: &Path,
        mut on_progress: F,
    ) -> Result<ExtractionReport, UpdateError>
    where
        F: FnMut(ExtractionProgress),
    {
        let archive_error = |reason: String| UpdateError::Extraction {
            archive: archive.display().to_string(),
            reason,
        };

        let file = File::open(archive).map_err(|e| UpdateError::file_system("open archive", archive, &e))?;
        let mut zip = ZipArchive::new(file).map_err(|e| archive_error(e.to_string()))?;
        let total = zip.len();

        info!(archive = %archive.display(), entries = total, "Extracting archive");
        fs::create_dir_all(destination)
            .map_err(|e| UpdateError::file_system("create installation directory", destination, &e))?;

        let mut report = ExtractionReport::default();

        for index in 0..total {
            let mut entry = zip.by_index(index).map_err(|e| archive_error(e.to_string()))?;
            let name = entry.name().to_string();

            match relative_entry_path(&name, &self.prefix)? {
                EntryTarget::Root => {}
                EntryTarget::Directory(relative) | EntryTarget::File(relative)
                    if self.is_preserved(&relative) =>
                {
                    warn!(entry = %name, "Skipping archive entry inside the preserved directory");
                    report.skipped += 1;
                }
                EntryTarget::Directory(relative) => {
                    let target = destination.join(relative);
                    fs::create_dir_all(&target)
                        .map_err(|e| UpdateError::file_system("create directory", &target, &e))?;
                    report.directories += 1;
                }
                EntryTarget::File(relative) => {
                    let target = destination.join(&relative);
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)
                            .map_err(|e| UpdateError::file_system("create directory", parent, &e))?;
                    }

                    let mode = entry.unix_mode();
                    if is_symlink_mode(mode) {
                        write_symlink(&mut entry, destination, &relative, &target)?;
                    } else {
                        remove_existing_symlink(&target);
                        let mut out = File::create(&target)
                            .map_err(|e| UpdateError::file_system("create file", &target, &e))?;
                        let written = io::copy(&mut entry, &mut out).map_err(|e| {
                            archive_error(format!("failed to write '{}': {e}", relative.display()))
                        })?;
                        report.bytes += written;
                        apply_mode(&target, mode);
                    }
                    report.files += 1;
                }
            }

            on_progress(ExtractionProgress {
                processed: index + 1,
                total,
            });
        }

        debug!(
            files = report.files,
            directories = report.directories,
            bytes = report.bytes,
            skipped = report.skipped,
            "Extraction finished"
        );
        Ok(report)
    }
}

/// Map a raw archive entry name onto a path relative to the destination.
///
/// A leading `prefix/` or `prefix\` is stripped; names that do not start with
/// the prefix are kept as they are. Names that would escape the destination
/// (`..`, absolute paths, drive letters) are rejected.
pub fn relative_entry_path(name: &str, prefix: &str) -> Result<EntryTarget, UpdateError> {
    let normalized = name.replace('\\', "/");

    let stripped = if prefix.is_empty() {
        normalized.as_str()
    } else if normalized == prefix {
        ""
    } else {
        normalized
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&normalized)
    };

    if stripped.is_empty() {
        return Ok(EntryTarget::Root);
    }

    let is_dir = stripped.ends_with('/');
    let unsafe_entry = || UpdateError::UnsafeArchiveEntry {
        entry: name.to_string(),
    };

    let mut relative = PathBuf::new();
    for (position, component) in Path::new(stripped).components().enumerate() {
        match component {
            Component::Normal(part) => {
                if position == 0 && looks_like_drive(part) {
                    return Err(unsafe_entry());
                }
                relative.push(part);
            }
            Component::CurDir => {}
            Component::RootDir | Component::ParentDir | Component::Prefix(_) => {
                return Err(unsafe_entry());
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Ok(EntryTarget::Root);
    }
    Ok(if is_dir {
        EntryTarget::Directory(relative)
    } else {
        EntryTarget::File(relative)
    })
}

fn looks_like_drive(part: &std::ffi::OsStr) -> bool {
    let bytes = part.as_encoded_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn is_symlink_mode(mode: Option<u32>) -> bool {
    mode.is_some_and(|mode| mode & 0o170_000 == 0o120_000)
}

fn remove_existing_symlink(target: &Path) {
    if fs::symlink_metadata(target).is_ok_and(|m| m.file_type().is_symlink()) {
        let _ = fs::remove_file(target);
    }
}

#[cfg(unix)]
fn apply_mode(target: &Path, mode: Option<u32>) {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        let permissions = fs::Permissions::from_mode(mode & 0o7777);
        if let Err(e) = fs::set_permissions(target, permissions) {
            debug!(path = %target.display(), error = %e, "Could not apply archive permissions");
        }
    }
}

#[cfg(not(unix))]
fn apply_mode(_target: &Path, _mode: Option<u32>) {}

/// Recreate a symlink entry. macOS app bundles rely on these inside
/// `Frameworks/`; the link must resolve inside the destination.
#[cfg(unix)]
fn write_symlink<R: io::Read>(
    entry: &mut R,
    destination: &Path,
    relative: &Path,
    target: &Path,
) -> Result<(), UpdateError> {
    let mut link = String::new();
    entry.read_to_string(&mut link).map_err(|e| UpdateError::Extraction {
        archive: destination.display().to_string(),
        reason: format!("unreadable link '{}': {e}", relative.display()),
    })?;

    let link_path = Path::new(&link);
    let base = relative.parent().unwrap_or(Path::new(""));
    if link_path.is_absolute() || !stays_inside(&base.join(link_path)) {
        return Err(UpdateError::UnsafeArchiveEntry {
            entry: format!("{} -> {link}", relative.display()),
        });
    }

    if fs::symlink_metadata(target).is_ok() {
        let _ = fs::remove_file(target);
    }
    std::os::unix::fs::symlink(link_path, target)
        .map_err(|e| UpdateError::file_system("create symlink", target, &e))
}

/// Without symlink support the link text is written as a plain file.
#[cfg(not(unix))]
fn write_symlink<R: io::Read>(
    entry: &mut R,
    _destination: &Path,
    _relative: &Path,
    target: &Path,
) -> Result<(), UpdateError> {
    let mut out =
        File::create(target).map_err(|e| UpdateError::file_system("create file", target, &e))?;
    io::copy(entry, &mut out).map_err(|e| UpdateError::file_system("write file", target, &e))?;
    Ok(())
}

/// Lexically check that `path` never climbs above its starting point.
#[cfg(unix)]
fn stays_inside(path: &Path) -> bool {
    let mut depth: usize = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

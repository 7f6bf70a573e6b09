//! Clearing out generated models.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::JobResult;

/// What [`clean_generated`] removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Files and symlinks removed.
    pub files_removed: usize,
    /// Directories removed, with their contents.
    pub dirs_removed: usize,
    /// Entries that could not be removed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    /// Whether every entry was removed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Remove everything inside `dir`, keeping `dir` itself.
///
/// Symlinks are removed, never followed. Individual failures are logged and
/// collected rather than aborting the sweep. A missing `dir` is already clean.
///
/// # Errors
///
/// Returns an error if `dir` exists but cannot be listed.
pub fn clean_generated(dir: &Path) -> JobResult<CleanupReport> {
    let mut report = CleanupReport::default();
    if !dir.exists() {
        info!(dir = %dir.display(), "Nothing to clean");
        return Ok(report);
    }

    for entry in fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Unreadable directory entry");
                report.failed.push((dir.to_path_buf(), e.to_string()));
                continue;
            }
        };

        let removed = fs::symlink_metadata(&path).and_then(|meta| {
            if meta.is_dir() {
                fs::remove_dir_all(&path).map(|()| true)
            } else {
                fs::remove_file(&path).map(|()| false)
            }
        });
        match removed {
            Ok(true) => report.dirs_removed += 1,
            Ok(false) => report.files_removed += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not remove");
                report.failed.push((path, e.to_string()));
            }
        }
    }

    info!(
        dir = %dir.display(),
        files = report.files_removed,
        dirs = report.dirs_removed,
        failed = report.failed.len(),
        "Cleaned generated models"
    );
    Ok(report)
}

//! Age-based retention sweep over the cache store.
//!
//! Content addressing means replaced sources leave their old renditions
//! behind. The sweep reclaims that space: every entry whose own modification
//! time is older than `now - days` is deleted. It never looks at source assets.
//!
//! The sweep is stateless and idempotent. A second run with no writes in
//! between deletes nothing. One entry failing to delete is logged and
//! recorded in the report; the rest of the sweep continues.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const SECONDS_PER_DAY: u64 = 86_400;

/// Default retention window.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Cache path {0} exists but is not a directory")]
    NotADirectory(PathBuf),
    #[error("Failed to inspect cache directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One entry that could not be inspected or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub days: u32,
    /// `false` when there was no cache directory to sweep.
    pub cache_dir_found: bool,
    pub deleted: u64,
    pub bytes_freed: u64,
    pub failures: Vec<SweepFailure>,
}

/// Oldest modification time that survives a sweep at `now`.
pub fn cutoff(now: SystemTime, days: u32) -> SystemTime {
    now.checked_sub(Duration::from_secs(u64::from(days) * SECONDS_PER_DAY))
        .unwrap_or(UNIX_EPOCH)
}

/// Delete every file under `cache_dir` last modified before `now - days`.
pub fn sweep(cache_dir: &Path, days: u32, now: SystemTime) -> Result<SweepReport, SweepError> {
    let mut report = SweepReport {
        days,
        ..SweepReport::default()
    };

    match std::fs::metadata(cache_dir) {
        Ok(meta) if meta.is_dir() => report.cache_dir_found = true,
        Ok(_) => return Err(SweepError::NotADirectory(cache_dir.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %cache_dir.display(), "No cache directory to sweep");
            return Ok(report);
        }
        Err(source) => {
            return Err(SweepError::Io {
                path: cache_dir.to_path_buf(),
                source,
            });
        }
    }

    let oldest_kept = cutoff(now, days);

    for entry in WalkDir::new(cache_dir).min_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                warn!(path = %path.display(), error = %e, "Failed to read cache entry");
                report.failures.push(SweepFailure {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to stat cache entry");
                report.failures.push(SweepFailure {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
                continue;
            }
        };
        let modified = match meta.modified() {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache entry has no modification time");
                report.failures.push(SweepFailure {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
                continue;
            }
        };
        if modified >= oldest_kept {
            continue;
        }

        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), bytes = meta.len(), "Deleted cache entry");
                report.deleted += 1;
                report.bytes_freed += meta.len();
            }
            // Already gone (another sweep, manual clear): nothing to reclaim.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to delete cache entry");
                report.failures.push(SweepFailure {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        dir = %cache_dir.display(),
        days,
        deleted = report.deleted,
        bytes_freed = report.bytes_freed,
        failures = report.failures.len(),
        "Cache sweep finished"
    );
    Ok(report)
}

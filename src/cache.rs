//! Content-addressed disk cache for resized images.
//!
//! Decoding, resampling and re-encoding a large upload costs far more than
//! reading a small JPEG back from disk, so every rendition is written once and
//! served from the cache afterwards.
//!
//! # Design
//!
//! ## Cache keys
//!
//! A [`CacheKey`] is the SHA-256 of everything that determines the output
//! bytes: the logical path, requested width and height, fit mode, and the
//! source asset's last-modified time. Changing the source changes its mtime,
//! which changes the key, so a stale rendition is never served. There is no
//! explicit invalidation; superseded entries are orphaned and left to the
//! [retention sweep](crate::sweep).
//!
//! ## Storage
//!
//! Entries live in one flat directory as `<hex digest>.jpg`. Entries are
//! immutable: same key, same bytes. Writes go to a temporary sibling and are
//! renamed into place so readers never see a partial file. Two requests
//! populating the same key at once both write complete, equivalent files and
//! the last rename wins.
//!
//! ## Reads racing the sweep
//!
//! [`CacheStore::get`] reads directly instead of checking existence first. A
//! file removed between lookup and read is reported as a miss, never an error.

use crate::imaging::{Fit, TargetSize};
use crate::storage::AssetPath;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Extension of every cache entry.
pub const CACHE_EXTENSION: &str = "jpg";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to create cache directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Failed to read cache entry {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write cache entry {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Digest identifying one rendition of one source at one point in its history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn compute(
        path: &AssetPath,
        target: TargetSize,
        fit: Fit,
        source_modified: SystemTime,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"resize\0");
        hasher.update(path.as_str().as_bytes());
        hasher.update(b"\0");
        for axis in [target.width, target.height] {
            match axis {
                Some(v) => {
                    hasher.update(b"\x01");
                    hasher.update(v.to_le_bytes());
                }
                None => hasher.update(b"\x00"),
            }
        }
        hasher.update(fit.as_str().as_bytes());
        hasher.update(b"\0");
        // Times before the epoch collapse to zero; they do not occur on real uploads.
        let since_epoch = source_modified
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        hasher.update(since_epoch.as_secs().to_le_bytes());
        hasher.update(since_epoch.subsec_nanos().to_le_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, CACHE_EXTENSION)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flat directory of cached renditions.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| CacheError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// `Ok(None)` on a miss, including an entry deleted mid-lookup.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Read { path, source }),
        }
    }

    /// Persist an entry, creating the cache directory if it is missing.
    pub fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        self.ensure_dir()?;
        let path = self.path_for(key);
        let temp = self.dir.join(format!(
            ".{}.{}-{}.tmp",
            key.as_str(),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let write = std::fs::write(&temp, bytes).and_then(|()| std::fs::rename(&temp, &path));
        if let Err(source) = write {
            let _ = std::fs::remove_file(&temp);
            return Err(CacheError::Write { path, source });
        }
        Ok(path)
    }
}

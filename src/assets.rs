//! Asset lookup and resolution.
//!
//! The media subsystem that owns uploads is outside this crate. What the
//! image service needs from it is one question: "what is at this path, what
//! type is it, and when did it last change?" That question is the
//! [`AssetLookup`] trait. [`MediaIndex`] answers it from a JSON index file.
//!
//! Resolution is an explicit ordered chain of [`Strategy`] values tried by a
//! [`Resolver`]. The default chain is:
//!
//! 1. [`Strategy::Indexed`]: a record in the lookup
//! 2. [`Strategy::RawFile`]: a file in the storage tree that is not indexed yet
//!
//! The first strategy that finds the asset wins and its [`Origin`] travels
//! with the result, since unindexed files are served as-is.
//!
//! ## Index file format
//!
//! ```json
//! {
//!   "5/photo.jpg": { "mime_type": "image/jpeg", "size": 48213, "last_modified": 1718000000 }
//! }
//! ```
//!
//! `last_modified` is UNIX seconds.

use crate::storage::{AssetPath, DiskStorage, StorageError, guess_mime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to read media index {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed media index {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Media index {path}: record {key:?} has an out-of-range last_modified ({value})")]
    Timestamp {
        path: PathBuf,
        key: String,
        value: u64,
    },
}

/// What the service knows about a stored asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: AssetPath,
    pub mime_type: String,
    pub size: Option<u64>,
    pub last_modified: SystemTime,
}

impl Asset {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Read-only lookup from logical path to asset record.
pub trait AssetLookup: Send + Sync {
    fn find(&self, path: &AssetPath) -> Option<Asset>;
}

/// One record of the media index file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// UNIX seconds.
    pub last_modified: u64,
}

impl IndexRecord {
    /// `None` when the timestamp does not fit in a `SystemTime`.
    pub fn modified_time(&self) -> Option<SystemTime> {
        UNIX_EPOCH.checked_add(Duration::from_secs(self.last_modified))
    }
}

/// In-memory media index, usually loaded from a JSON file at startup.
#[derive(Debug, Clone, Default)]
pub struct MediaIndex {
    records: HashMap<String, IndexRecord>,
}

impl MediaIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load an index file. A missing file is an empty index; a malformed one
    /// is an error.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(source) => {
                return Err(IndexError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let records: HashMap<String, IndexRecord> =
            serde_json::from_str(&content).map_err(|source| IndexError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some((key, record)) = records.iter().find(|(_, r)| r.modified_time().is_none()) {
            return Err(IndexError::Timestamp {
                path: path.to_path_buf(),
                key: key.clone(),
                value: record.last_modified,
            });
        }
        Ok(Self { records })
    }

    pub fn insert(&mut self, path: impl Into<String>, record: IndexRecord) {
        self.records.insert(path.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AssetLookup for MediaIndex {
    fn find(&self, path: &AssetPath) -> Option<Asset> {
        let record = self.records.get(path.as_str())?;
        Some(Asset {
            path: path.clone(),
            mime_type: record.mime_type.clone(),
            size: record.size,
            last_modified: record.modified_time()?,
        })
    }
}

/// One way of finding an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Ask the [`AssetLookup`].
    Indexed,
    /// Stat the file in the storage tree.
    RawFile,
}

/// Which strategy produced a [`Resolved`] asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Indexed,
    RawFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub asset: Asset,
    pub origin: Origin,
}

/// Tries each strategy in order; the first hit wins.
#[derive(Clone)]
pub struct Resolver {
    strategies: Vec<Strategy>,
    lookup: Arc<dyn AssetLookup>,
    storage: DiskStorage,
}

impl Resolver {
    pub const DEFAULT_CHAIN: [Strategy; 2] = [Strategy::Indexed, Strategy::RawFile];

    pub fn new(lookup: Arc<dyn AssetLookup>, storage: DiskStorage) -> Self {
        Self::with_strategies(Self::DEFAULT_CHAIN.to_vec(), lookup, storage)
    }

    pub fn with_strategies(
        strategies: Vec<Strategy>,
        lookup: Arc<dyn AssetLookup>,
        storage: DiskStorage,
    ) -> Self {
        Self {
            strategies,
            lookup,
            storage,
        }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn resolve(&self, path: &AssetPath) -> Result<Option<Resolved>, StorageError> {
        for strategy in &self.strategies {
            if let Some(resolved) = self.try_strategy(*strategy, path)? {
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }

    fn try_strategy(
        &self,
        strategy: Strategy,
        path: &AssetPath,
    ) -> Result<Option<Resolved>, StorageError> {
        match strategy {
            Strategy::Indexed => Ok(self.lookup.find(path).map(|asset| Resolved {
                asset,
                origin: Origin::Indexed,
            })),
            Strategy::RawFile => Ok(self.storage.stat(path)?.map(|stat| Resolved {
                asset: Asset {
                    path: path.clone(),
                    mime_type: guess_mime(path).to_string(),
                    size: Some(stat.size),
                    last_modified: stat.modified,
                },
                origin: Origin::RawFile,
            })),
        }
    }
}

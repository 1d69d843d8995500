//! Resize-and-cache orchestration.
//!
//! [`ImageService::serve`] turns `{path, w?, h?, fit?}` into response bytes:
//!
//! ```text
//! no w/h ─────────────────────────────────────────────► original bytes
//! w/h invalid ────────────────────────────────────────► 400 InvalidDimensions
//! resolve path ── nothing ────────────────────────────► 404 NotFound
//!              ── unindexed raw file / non-image ─────► original bytes
//! cache key ───── hit ────────────────────────────────► cached JPEG
//!           ───── miss ── transform ok ── persist ────► fresh JPEG
//!                        └ transform failed ──────────► original bytes
//! ```
//!
//! # Fail-open policy
//!
//! Callers only ever see 400 or 404. A transform failure is logged and the
//! original is served instead. A cache write failure is logged and the fresh
//! bytes are served from memory. Availability wins over resize correctness
//! and over cache persistence.
//!
//! # Concurrency
//!
//! No coordination between requests for the same key: two simultaneous misses
//! both transform and both write equivalent bytes. [`serve`](ImageService::serve)
//! is synchronous and CPU-bound; async callers run it on a blocking thread.

use crate::assets::{AssetLookup, IndexError, MediaIndex, Origin, Resolver};
use crate::cache::{CacheKey, CacheStore};
use crate::config::ServerConfig;
use crate::imaging::{Fit, ImageBackend, Quality, RustBackend, TargetSize, TransformParams};
use crate::storage::{AssetPath, DiskStorage, StorageError, guess_mime};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Raw query parameters exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageQuery {
    pub w: Option<String>,
    pub h: Option<String>,
    pub fit: Option<String>,
}

impl ImageQuery {
    pub fn new(w: Option<&str>, h: Option<&str>, fit: Option<&str>) -> Self {
        Self {
            w: w.map(str::to_string),
            h: h.map(str::to_string),
            fit: fit.map(str::to_string),
        }
    }
}

/// How a response body was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Original bytes, no transform requested or possible.
    Original,
    /// Served from the cache store.
    CacheHit,
    /// Freshly transformed on this request.
    Transformed,
    /// Transform failed; original bytes served instead.
    Fallback,
}

/// A response ready for the HTTP layer.
#[derive(Debug, Clone)]
pub struct Served {
    pub body: Vec<u8>,
    pub content_type: String,
    /// Only set for cached or freshly transformed output.
    pub cache_control: Option<String>,
    pub outcome: Outcome,
}

/// Request-independent settings, fixed at construction.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub quality: Quality,
    pub max_dimension: u32,
    pub cache_control: String,
    pub cache_enabled: bool,
}

impl ServiceOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            quality: Quality::new(config.images.quality),
            max_dimension: config.images.max_dimension,
            cache_control: config.cache.cache_control(),
            cache_enabled: config.cache.enabled,
        }
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// Parse one dimension parameter. Absent or empty is `None`; anything that is
/// not an integer in `1..=max` is rejected.
pub fn parse_dimension(name: &str, raw: Option<&str>, max: u32) -> Result<Option<u32>, ServeError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let value: i64 = raw
        .parse()
        .map_err(|_| ServeError::InvalidDimensions(format!("{name}={raw:?} is not an integer")))?;
    if value <= 0 || value > i64::from(max) {
        return Err(ServeError::InvalidDimensions(format!(
            "{name}={value} must be between 1 and {max}"
        )));
    }
    Ok(Some(value as u32))
}

pub struct ImageService {
    resolver: Resolver,
    storage: DiskStorage,
    cache: Option<CacheStore>,
    backend: Arc<dyn ImageBackend>,
    options: ServiceOptions,
}

impl ImageService {
    /// Build a service. Cache availability is decided here, once: if caching
    /// is enabled but the directory cannot be created, the service runs
    /// without a cache.
    pub fn new(
        lookup: Arc<dyn AssetLookup>,
        storage: DiskStorage,
        cache: CacheStore,
        backend: Arc<dyn ImageBackend>,
        options: ServiceOptions,
    ) -> Self {
        let cache = if options.cache_enabled {
            match cache.ensure_dir() {
                Ok(()) => Some(cache),
                Err(e) => {
                    warn!(error = %e, "Image cache unavailable, serving uncached renditions");
                    None
                }
            }
        } else {
            None
        };

        Self {
            resolver: Resolver::new(lookup, storage.clone()),
            storage,
            cache,
            backend,
            options,
        }
    }

    /// Production wiring: media index from disk, `RustBackend`, config options.
    pub fn from_config(config: &ServerConfig) -> Result<Self, IndexError> {
        let index = match config.index_path() {
            Some(path) => MediaIndex::load(path)?,
            None => MediaIndex::empty(),
        };
        debug!(records = index.len(), "Loaded media index");
        Ok(Self::new(
            Arc::new(index),
            DiskStorage::new(&config.storage.root),
            CacheStore::new(&config.cache.dir),
            Arc::new(RustBackend::new()),
            ServiceOptions::from_config(config),
        ))
    }

    pub fn cache_available(&self) -> bool {
        self.cache.is_some()
    }

    pub fn serve(&self, raw_path: &str, query: &ImageQuery) -> Result<Served, ServeError> {
        let path = AssetPath::parse(raw_path)
            .map_err(|_| ServeError::NotFound(raw_path.to_string()))?;

        let max = self.options.max_dimension;
        let target = TargetSize::new(
            parse_dimension("w", query.w.as_deref(), max)?,
            parse_dimension("h", query.h.as_deref(), max)?,
        );
        let fit = query.fit.as_deref().map(Fit::parse).unwrap_or_default();

        let resolved = self
            .resolver
            .resolve(&path)
            .map_err(|e| ServeError::Internal(e.to_string()))?
            .ok_or_else(|| ServeError::NotFound(path.to_string()))?;
        let asset = resolved.asset;

        if target.is_empty() || resolved.origin == Origin::RawFile || !asset.is_image() {
            return self.serve_original(&path, &asset.mime_type, Outcome::Original);
        }

        let key = CacheKey::compute(&path, target, fit, asset.last_modified);
        if let Some(bytes) = self.cached(&key) {
            debug!(path = %path, key = %key, "Image cache hit");
            return Ok(self.resized(bytes, Outcome::CacheHit));
        }
        debug!(path = %path, key = %key, "Image cache miss");

        let original = self
            .storage
            .read(&path)
            .map_err(|e| ServeError::Internal(e.to_string()))?;
        let params = TransformParams {
            target,
            fit,
            quality: self.options.quality,
        };

        match self.backend.transform(&original, &params) {
            Ok(transformed) => {
                if let Some(cache) = &self.cache
                    && let Err(e) = cache.put(&key, &transformed.bytes)
                {
                    warn!(path = %path, key = %key, error = %e, "Failed to persist resized image");
                }
                Ok(self.resized(transformed.bytes, Outcome::Transformed))
            }
            Err(e) => {
                error!(path = %path, error = %e, "Image resize failed, serving original");
                Ok(Served {
                    body: original,
                    content_type: asset.mime_type,
                    cache_control: None,
                    outcome: Outcome::Fallback,
                })
            }
        }
    }

    fn cached(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let cache = self.cache.as_ref()?;
        match cache.get(key) {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "Unreadable cache entry, regenerating");
                None
            }
        }
    }

    fn resized(&self, body: Vec<u8>, outcome: Outcome) -> Served {
        Served {
            body,
            content_type: "image/jpeg".to_string(),
            cache_control: Some(self.options.cache_control.clone()),
            outcome,
        }
    }

    fn serve_original(
        &self,
        path: &AssetPath,
        mime_type: &str,
        outcome: Outcome,
    ) -> Result<Served, ServeError> {
        let body = self.storage.read(path).map_err(|e| match e {
            StorageError::NotFound(p) => ServeError::NotFound(p),
            other => ServeError::Internal(other.to_string()),
        })?;
        let content_type = if mime_type.is_empty() {
            guess_mime(path).to_string()
        } else {
            mime_type.to_string()
        };
        Ok(Served {
            body,
            content_type,
            cache_control: None,
            outcome,
        })
    }
}

//! Shared test utilities for the imgserve test suite.
//!
//! Provides synthetic image encoders and a [`Fixture`] that lays out a
//! storage tree, a media index and a cache directory in a temp dir.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fx = Fixture::new();
//! fx.add_indexed_jpeg("5/photo.jpg", 1200, 800, 1_000);
//! let (service, backend) = fx.mock_service();
//!
//! service.serve("5/photo.jpg", &ImageQuery::new(Some("300"), None, None)).unwrap();
//! assert_eq!(backend.calls(), 1);
//! assert_eq!(fx.cache_entries(), 1);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::assets::{Asset, AssetLookup, IndexRecord, MediaIndex};
use crate::cache::CacheStore;
use crate::imaging::ImageBackend;
use crate::imaging::backend::tests::MockBackend;
use crate::service::{ImageService, ServiceOptions};
use crate::storage::{AssetPath, DiskStorage};

// =========================================================================
// Synthetic images
// =========================================================================

/// A `width`×`height` RGB gradient encoded as JPEG.
pub fn encode_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 90)
        .encode_image(&img)
        .unwrap();
    buf
}

/// A `width`×`height` half-transparent RGBA image encoded as PNG.
pub fn encode_test_png_rgba(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, _| {
        image::Rgba([200, 40, 40, if x % 2 == 0 { 255 } else { 0 }])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

// =========================================================================
// Service fixture
// =========================================================================

/// Lookup backed by a mutex so tests can add records after construction.
struct SharedIndex(Arc<Mutex<MediaIndex>>);

impl AssetLookup for SharedIndex {
    fn find(&self, path: &AssetPath) -> Option<Asset> {
        self.0.lock().unwrap().find(path)
    }
}

/// Temp storage root (`public/`), its image cache and an in-memory index.
pub struct Fixture {
    tmp: TempDir,
    index: Arc<Mutex<MediaIndex>>,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("public")).unwrap();
        Self {
            tmp,
            index: Arc::new(Mutex::new(MediaIndex::empty())),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.tmp.path().join("public")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root().join("cache/images")
    }

    /// Write a file under the storage root without indexing it.
    pub fn write_raw(&self, path: &str, bytes: &[u8]) {
        let full = self.root().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, bytes).unwrap();
    }

    /// Record an index entry with no file behind it.
    pub fn index_only(&self, path: &str, mime_type: &str, last_modified: u64) {
        self.index.lock().unwrap().insert(
            path,
            IndexRecord {
                mime_type: mime_type.into(),
                size: None,
                last_modified,
            },
        );
    }

    pub fn add_indexed(&self, path: &str, bytes: &[u8], mime_type: &str, last_modified: u64) {
        self.write_raw(path, bytes);
        self.index_only(path, mime_type, last_modified);
    }

    /// Write and index a synthetic JPEG; returns its bytes.
    pub fn add_indexed_jpeg(&self, path: &str, width: u32, height: u32, last_modified: u64) -> Vec<u8> {
        let bytes = encode_test_jpeg(width, height);
        self.add_indexed(path, &bytes, "image/jpeg", last_modified);
        bytes
    }

    pub fn service_with<B: ImageBackend + 'static>(
        &self,
        backend: Arc<B>,
        options: ServiceOptions,
    ) -> ImageService {
        ImageService::new(
            Arc::new(SharedIndex(self.index.clone())),
            DiskStorage::new(self.root()),
            CacheStore::new(self.cache_dir()),
            backend,
            options,
        )
    }

    pub fn mock_service(&self) -> (ImageService, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::new());
        let service = self.service_with(backend.clone(), ServiceOptions::default());
        (service, backend)
    }

    /// Number of finished entries in the cache directory.
    pub fn cache_entries(&self) -> usize {
        count_entries(&self.cache_dir())
    }
}

fn count_entries(dir: &Path) -> usize {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "jpg"))
            .count(),
        Err(_) => 0,
    }
}

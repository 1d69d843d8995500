//! # imgserve
//!
//! On-demand image resizing over HTTP with a content-addressed disk cache.
//! A request names a stored image plus optional width, height and fit; the
//! first request for a given rendition decodes, resizes and re-encodes the
//! source, every later one is answered from disk.
//!
//! # Architecture: Resolve, Key, Serve
//!
//! ```text
//! GET /images/5/photo.jpg?w=300&h=200&fit=cover
//!   1. Validate   w, h in 1..=5000              → 400 otherwise
//!   2. Resolve    media index → raw file        → 404 if neither
//!   3. Key        sha256(path, w, h, fit, mtime)
//!   4. Serve      cache hit  → cached JPEG
//!                 cache miss → resize → persist → JPEG
//! ```
//!
//! Alongside the server, `imgserve cleanup` sweeps cache entries older than a
//! retention window.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Resize geometry, the `ImageBackend` trait and its pure-Rust implementation |
//! | [`storage`] | Validated logical paths and reads under the storage root |
//! | [`assets`] | Asset records, the media index lookup and the resolution chain |
//! | [`cache`] | Cache keys and the flat directory of cached renditions |
//! | [`sweep`] | Age-based retention sweep over the cache directory |
//! | [`service`] | Request validation and serve-or-populate orchestration |
//! | [`http`] | `axum` router for `GET /images/*path` |
//! | [`urls`] | URL builders with the thumbnail/medium/large presets |
//! | [`config`] | `imgserve.toml` loading, merging over stock defaults, validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Keys Instead of Invalidation
//!
//! The source's last-modified time is part of the cache key. Replacing an
//! upload changes its key, so a stale rendition can never be served and
//! nothing has to be purged on write. The cost is orphaned entries, which is
//! what the [`sweep`] is for.
//!
//! ## Fail Open
//!
//! A corrupt upload or a decoder gap never turns into an error page: the
//! original bytes are served instead. A full or read-only cache disk only
//! costs performance, since fresh renditions are served from memory.
//!
//! ## JPEG-Only Output
//!
//! Every rendition is a JPEG regardless of source format. One output format
//! keeps cache entries uniform (`<hex>.jpg`) and the content type fixed.
//! Transparency is flattened.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and encoding use the `image` crate. No
//! ImageMagick, no system libraries; the binary is self-contained.

pub mod assets;
pub mod cache;
pub mod config;
pub mod http;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod service;
pub mod storage;
pub mod sweep;
pub mod urls;

#[cfg(test)]
pub(crate) mod test_helpers;

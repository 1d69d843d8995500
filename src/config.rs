//! Server configuration module.
//!
//! Handles loading, validating, and merging `imgserve.toml`. User files are
//! sparse: stock defaults are the base layer and any key the file sets
//! overrides it.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! bind = "127.0.0.1:8080"          # Listen address for `imgserve serve`
//!
//! [storage]
//! root = "storage/public"          # Logical asset paths are relative to this
//! index = "storage/media.json"     # Media index (empty string = no index)
//!
//! [cache]
//! enabled = true                   # Persist renditions to disk
//! dir = "storage/public/cache/images"
//! retention_days = 30              # Default for `imgserve cleanup`
//! max_age = 31536000               # Cache-Control max-age on resized output
//!
//! [images]
//! quality = 90                     # JPEG quality (1-100)
//! max_dimension = 5000             # Largest accepted w/h (1-5000)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::MAX_DIMENSION;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "imgserve.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Server configuration loaded from `imgserve.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP listener settings.
    pub server: ListenConfig,
    /// Where original assets live.
    pub storage: StorageConfig,
    /// Rendition cache settings.
    pub cache: CacheConfig,
    /// Transform settings.
    pub images: ImagesConfig,
}

impl ServerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind must be a socket address like 127.0.0.1:8080 (got {:?})",
                self.server.bind
            )));
        }
        if self.storage.root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.root must not be empty".into(),
            ));
        }
        if self.cache.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("cache.dir must not be empty".into()));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if !(1..=MAX_DIMENSION).contains(&self.images.max_dimension) {
            return Err(ConfigError::Validation(format!(
                "images.max_dimension must be 1-{MAX_DIMENSION}"
            )));
        }
        Ok(())
    }

    /// Parsed listen address. Only valid after [`validate`](Self::validate).
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|e| ConfigError::Validation(format!("server.bind: {e}")))
    }

    /// The media index path, if one is configured.
    pub fn index_path(&self) -> Option<&Path> {
        self.storage
            .index
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenConfig {
    pub bind: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Original asset storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Root directory of the storage tree.
    pub root: PathBuf,
    /// JSON media index. Missing file means an empty index.
    pub index: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("storage/public"),
            index: Some(PathBuf::from("storage/media.json")),
        }
    }
}

/// Rendition cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// When false, renditions are computed per request and never stored.
    pub enabled: bool,
    pub dir: PathBuf,
    /// Age in days after which `cleanup` deletes an entry.
    pub retention_days: u32,
    /// `Cache-Control: max-age` for resized responses, in seconds.
    pub max_age: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("storage/public/cache/images"),
            retention_days: crate::sweep::DEFAULT_RETENTION_DAYS,
            max_age: 31_536_000,
        }
    }
}

impl CacheConfig {
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.max_age)
    }
}

/// Transform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG quality (1-100).
    pub quality: u32,
    /// Largest accepted width or height in a request.
    pub max_dimension: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            max_dimension: MAX_DIMENSION,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ServerConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ServerConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `imgserve.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgserve Configuration
# ======================
#
# All settings are optional. Remove or comment out any you don't need;
# stock defaults are used for anything not set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# HTTP listener
# ---------------------------------------------------------------------------
[server]
# Address `imgserve serve` listens on.
bind = "127.0.0.1:8080"

# ---------------------------------------------------------------------------
# Original assets
# ---------------------------------------------------------------------------
[storage]
# Root of the storage tree. A request for /images/5/photo.jpg reads
# <root>/5/photo.jpg.
root = "storage/public"

# JSON media index mapping logical paths to mime type and last-modified
# time. Files present on disk but missing from the index are served as-is.
# Set to "" to run without an index.
index = "storage/media.json"

# ---------------------------------------------------------------------------
# Rendition cache
# ---------------------------------------------------------------------------
[cache]
# Persist resized images. When false every resize is recomputed.
enabled = true

# Flat directory of <sha256>.jpg entries.
dir = "storage/public/cache/images"

# `imgserve cleanup` deletes entries older than this many days.
retention_days = 30

# Cache-Control max-age (seconds) sent with resized images.
max_age = 31536000

# ---------------------------------------------------------------------------
# Transforms
# ---------------------------------------------------------------------------
[images]
# JPEG quality for resized output (1-100).
quality = 90

# Largest width or height a request may ask for (1-5000).
max_dimension = 5000
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ServerConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.storage.root, PathBuf::from("storage/public"));
        assert!(config.cache.enabled);
        assert_eq!(config.cache.retention_days, 30);
        assert_eq!(config.cache.cache_control(), "public, max-age=31536000");
        assert_eq!(config.images.quality, 90);
        assert_eq!(config.images.max_dimension, 5000);
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config.cache.dir, PathBuf::from("storage/public/cache/images"));
    }

    #[test]
    fn load_config_merges_sparse_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"
[cache]
retention_days = 7

[images]
quality = 75
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.cache.retention_days, 7);
        assert_eq!(config.images.quality, 75);
        // Untouched values keep their defaults
        assert!(config.cache.enabled);
        assert_eq!(config.images.max_dimension, 5000);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let overlay: toml::Value = toml::from_str("[cache]\nretention = 3\n").unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let overlay: toml::Value = toml::from_str("[thumbnails]\nsize = 3\n").unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = ServerConfig::default();
        config.images.quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.images.quality = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.images.quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_max_dimension_bounds() {
        let mut config = ServerConfig::default();
        config.images.max_dimension = 5001;
        assert!(config.validate().is_err());
        config.images.max_dimension = 0;
        assert!(config.validate().is_err());
        config.images.max_dimension = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_bind_address() {
        let mut config = ServerConfig::default();
        config.server.bind = "localhost".into();
        assert!(config.validate().is_err());
        config.server.bind = "0.0.0.0:9000".into();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr().unwrap().port(), 9000);
    }

    #[test]
    fn empty_index_means_none() {
        let overlay: toml::Value = toml::from_str("[storage]\nindex = \"\"\n").unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert!(config.index_path().is_none());
        assert_eq!(
            ServerConfig::default().index_path(),
            Some(Path::new("storage/media.json"))
        );
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str("[a.b]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a.b]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["b"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["b"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(Some(value)).unwrap();
        let defaults = ServerConfig::default();
        assert_eq!(config.server.bind, defaults.server.bind);
        assert_eq!(config.storage.root, defaults.storage.root);
        assert_eq!(config.storage.index, defaults.storage.index);
        assert_eq!(config.cache.dir, defaults.cache.dir);
        assert_eq!(config.cache.max_age, defaults.cache.max_age);
        assert_eq!(config.images.quality, defaults.images.quality);
    }
}

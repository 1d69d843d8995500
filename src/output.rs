//! CLI output formatting.
//!
//! Every command's summary is built by a pure `format_*` function that
//! returns lines, with a thin `print_*` wrapper that writes them to stdout.
//! Tests assert on the lines; only `main` calls the printers.
//!
//! # Output Format
//!
//! ## Cleanup
//!
//! ```text
//! Deleted 12 cached images older than 30 days.
//! Freed up 3.41 MB of disk space.
//! ```
//!
//! or, when nothing qualified:
//!
//! ```text
//! No cached images older than 30 days found.
//! ```
//!
//! Entries that could not be removed follow as indented `Failed:` lines.
//!
//! ## Check
//!
//! ```text
//! Config
//!     imgserve.toml
//! Server
//!     Bind: 127.0.0.1:8080
//! Storage
//!     Root: storage/public
//!     Index: storage/media.json
//! Cache
//!     Dir: storage/public/cache/images (enabled)
//!     Retention: 30 days
//!     Cache-Control: public, max-age=31536000
//! Images
//!     Quality: 90
//!     Max dimension: 5000
//! ```

use crate::config::ServerConfig;
use crate::sweep::SweepReport;
use std::path::Path;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// 1024-based human-readable size with two decimals.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value > 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

// ============================================================================
// Cleanup
// ============================================================================

pub fn format_sweep_output(report: &SweepReport) -> Vec<String> {
    if !report.cache_dir_found {
        return vec!["No image cache directory found.".to_string()];
    }

    let mut lines = Vec::new();
    if report.deleted > 0 {
        lines.push(format!(
            "Deleted {} cached images older than {} days.",
            report.deleted, report.days
        ));
        lines.push(format!(
            "Freed up {} of disk space.",
            format_bytes(report.bytes_freed)
        ));
    } else {
        lines.push(format!(
            "No cached images older than {} days found.",
            report.days
        ));
    }
    for failure in &report.failures {
        lines.push(format!(
            "    Failed: {} ({})",
            failure.path.display(),
            failure.error
        ));
    }
    lines
}

pub fn print_sweep_output(report: &SweepReport) {
    for line in format_sweep_output(report) {
        println!("{line}");
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_config_check(config: &ServerConfig, source: Option<&Path>) -> Vec<String> {
    let mut lines = vec!["Config".to_string()];
    match source {
        Some(path) => lines.push(format!("    {}", path.display())),
        None => lines.push("    (stock defaults)".to_string()),
    }

    lines.push("Server".to_string());
    lines.push(format!("    Bind: {}", config.server.bind));

    lines.push("Storage".to_string());
    lines.push(format!("    Root: {}", config.storage.root.display()));
    match config.index_path() {
        Some(index) => lines.push(format!("    Index: {}", index.display())),
        None => lines.push("    Index: none".to_string()),
    }

    lines.push("Cache".to_string());
    lines.push(format!(
        "    Dir: {} ({})",
        config.cache.dir.display(),
        if config.cache.enabled { "enabled" } else { "disabled" }
    ));
    lines.push(format!("    Retention: {} days", config.cache.retention_days));
    lines.push(format!("    Cache-Control: {}", config.cache.cache_control()));

    lines.push("Images".to_string());
    lines.push(format!("    Quality: {}", config.images.quality));
    lines.push(format!("    Max dimension: {}", config.images.max_dimension));
    lines
}

pub fn print_config_check(config: &ServerConfig, source: Option<&Path>) {
    for line in format_config_check(config, source) {
        println!("{line}");
    }
}

//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! the request layer (which parses query strings) and the
//! [`backend`](super::backend) (which does the pixel work), so the backend can
//! be swapped for a recording mock in tests.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 90). Clamped on construction.
//! - [`Fit`]: How a source maps into a requested box (`contain`, `cover`, `fill`).
//! - [`TargetSize`]: Optional width and/or height of the rendition.
//! - [`TransformParams`]: Full specification for one transform.

use std::fmt;
use std::str::FromStr;

/// Largest accepted value on either axis.
pub const MAX_DIMENSION: u32 = 5000;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Fit mode used when both width and height are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Fit {
    /// Scale to fit inside the box, preserving aspect ratio. No cropping.
    #[default]
    Contain,
    /// Scale to cover the box, preserving aspect ratio, then centre-crop.
    Cover,
    /// Stretch to exactly the box.
    Fill,
}

impl Fit {
    /// Lenient parse: anything unrecognised is [`Fit::Contain`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "cover" => Fit::Cover,
            "fill" => Fit::Fill,
            _ => Fit::Contain,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Fit::Contain => "contain",
            Fit::Cover => "cover",
            Fit::Fill => "fill",
        }
    }
}

impl FromStr for Fit {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Fit::parse(s))
    }
}

impl fmt::Display for Fit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested output geometry. At least one axis should be set before the
/// backend is invoked; an empty target means "serve the original".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TargetSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TargetSize {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

/// Parameters for one transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformParams {
    pub target: TargetSize,
    pub fit: Fit,
    pub quality: Quality,
}

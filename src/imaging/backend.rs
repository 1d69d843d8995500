//! Image transform backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the single seam between request handling and
//! pixel work: bytes in, encoded bytes out. It performs no I/O.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::TransformParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Failed to decode source image: {0}")]
    Decode(String),
    #[error("Unsupported dimensions: {0}")]
    UnsupportedDimensions(String),
    #[error("Failed to encode output image: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Encoded output of a transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
    /// Always `image/jpeg` for the production backend.
    pub content_type: &'static str,
}

/// Trait for image transform backends.
///
/// Implementations must be deterministic for identical input and must never
/// fail on geometrically degenerate but valid requests such as 1×1.
pub trait ImageBackend: Send + Sync {
    /// Decode `source`, resize per `params`, and re-encode.
    fn transform(
        &self,
        source: &[u8],
        params: &TransformParams,
    ) -> Result<Transformed, TransformError>;
}

/// Reject targets the backend cannot honour before any decoding happens.
pub fn check_target(params: &TransformParams) -> Result<(), TransformError> {
    let target = params.target;
    if target.is_empty() {
        return Err(TransformError::UnsupportedDimensions(
            "neither width nor height requested".into(),
        ));
    }
    if target.width == Some(0) || target.height == Some(0) {
        return Err(TransformError::UnsupportedDimensions(format!(
            "width and height must be positive (got {:?}x{:?})",
            target.width, target.height
        )));
    }
    Ok(())
}

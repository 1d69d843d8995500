//! Pure Rust transform backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::load_from_memory` (format sniffed from bytes) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Cover crop | `DynamicImage::crop_imm` centred on the source, before resizing |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//!
//! Geometry comes from [`plan_resize`](super::calculations::plan_resize); this
//! file only executes the plan.

use super::backend::{Dimensions, ImageBackend, TransformError, Transformed, check_target};
use super::calculations::{ResizePlan, plan_resize};
use super::params::{Quality, TransformParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Pure Rust backend using the `image` crate ecosystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Decode an image from memory, sniffing the format from its magic bytes.
fn decode(source: &[u8]) -> Result<DynamicImage, TransformError> {
    image::load_from_memory(source).map_err(|e| TransformError::Decode(e.to_string()))
}

/// Read pixel dimensions without keeping the decoded image around.
pub fn dimensions_of(source: &[u8]) -> Result<Dimensions, TransformError> {
    let (width, height) = decode(source)?.dimensions();
    Ok(Dimensions { width, height })
}

/// Crop first, then scale, so the working image never exceeds the source or
/// the output.
fn apply_plan(img: DynamicImage, plan: &ResizePlan) -> DynamicImage {
    let cropped = match plan.crop {
        Some(c) => img.crop_imm(c.x, c.y, c.width, c.height),
        None => img,
    };
    let (w, h) = plan.scale_to;
    if cropped.dimensions() == (w, h) {
        cropped
    } else {
        cropped.resize_exact(w, h, FilterType::Lanczos3)
    }
}

/// Encode as baseline JPEG. Alpha is dropped since JPEG has no alpha channel.
fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, TransformError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
    rgb.write_with_encoder(encoder)
        .map_err(|e| TransformError::Encode(e.to_string()))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn transform(
        &self,
        source: &[u8],
        params: &TransformParams,
    ) -> Result<Transformed, TransformError> {
        check_target(params)?;
        let img = decode(source)?;

        let plan = plan_resize(img.dimensions(), params.target, params.fit).ok_or_else(|| {
            TransformError::UnsupportedDimensions("neither width nor height requested".into())
        })?;
        let output = apply_plan(img, &plan);
        let (width, height) = output.dimensions();
        let bytes = encode_jpeg(&output, params.quality)?;

        Ok(Transformed {
            bytes,
            dimensions: Dimensions { width, height },
            content_type: "image/jpeg",
        })
    }
}

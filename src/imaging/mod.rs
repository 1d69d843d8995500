//! Transform engine. Pure Rust, no I/O.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Geometry** | [`plan_resize`] (contain / cover / fill / single axis) |
//! | **Resize** | Lanczos3 + centre crop |
//! | **Encode** | JPEG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a transform
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{Dimensions, ImageBackend, TransformError, Transformed};
pub use calculations::{ResizePlan, plan_resize};
pub use params::{Fit, MAX_DIMENSION, Quality, TargetSize, TransformParams};
pub use rust_backend::RustBackend;

//! Image processing, pure Rust on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify / info** | `image::ImageReader` (content-sniffed) |
//! | **Resize** | aspect fit + `resize_exact` (Lanczos3) → JPEG |
//! | **Crop / smart crop** | clamped region + `crop_imm` → JPEG |
//! | **Background removal** | corner-color threshold → RGBA PNG |
//! | **Background generation** | gradient canvas + composite/blend → JPEG |
//! | **Enhance** | `unsharpen` + contrast/color/brightness → JPEG |
//! | **Resolution enhance** | ≤2× upscale steps + enhance → JPEG |
//! | **Convert** | JPEG / PNG / lossless WebP encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and crop math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Effects**: Pixel transforms on decoded images
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The public surface: output naming, error tagging, logging

pub mod backend;
mod calculations;
pub mod effects;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, ImageInfo, Rendered};
pub use calculations::{
    calculate_fit_dimensions, calculate_smart_crop_region, clamp_crop_region,
};
pub use operations::{
    ImageProcessingError, OperationKind, OutputSettings, convert_format, crop, enhance_quality,
    enhance_resolution, generate_background, image_info, remove_background, resize, smart_crop,
};
pub use params::{CropRegion, CropRequest, CropStyle, OutputFormat, Quality, Resolution};
pub use rust_backend::RustBackend;

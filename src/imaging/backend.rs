//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines one method per transform: identify,
//! resize, crop, smart_crop, remove_background, generate_background,
//! enhance, upscale and convert. Each method reads one source file and
//! writes one output file; none of them decide *where* output goes.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust, built on
//! the `image` crate.

use super::params::{
    ConvertParams, CropParams, EnhanceParams, GenerateBackgroundParams, RemoveBackgroundParams,
    ResizeParams, SmartCropParams, UpscaleParams,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("failed to encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("unsupported resolution: {0}")]
    UnsupportedResolution(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Descriptive information about a source image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    /// Detected container format (`"jpeg"`, `"png"`, ...), if recognized.
    pub format: Option<String>,
    /// Decoded pixel layout (`"rgb8"`, `"rgba8"`, `"l8"`, ...).
    pub color: String,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
}

/// What a transform produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendered {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Every backend implements all transforms so the operation layer is
/// backend-agnostic.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode and describe an image.
    fn info(&self, path: &Path) -> Result<ImageInfo, BackendError>;

    /// Scale to the exact dimensions in `params` (already aspect-fitted).
    fn resize(&self, params: &ResizeParams) -> Result<Rendered, BackendError>;

    /// Extract a clamped rectangle.
    fn crop(&self, params: &CropParams) -> Result<Rendered, BackendError>;

    /// Crop to a style-derived region.
    fn smart_crop(&self, params: &SmartCropParams) -> Result<Rendered, BackendError>;

    /// Make corner-colored pixels transparent.
    fn remove_background(&self, params: &RemoveBackgroundParams)
    -> Result<Rendered, BackendError>;

    /// Put the source over a synthetic gradient.
    fn generate_background(
        &self,
        params: &GenerateBackgroundParams,
    ) -> Result<Rendered, BackendError>;

    /// Run the fixed sharpen/contrast/color/brightness chain.
    fn enhance(&self, params: &EnhanceParams) -> Result<Rendered, BackendError>;

    /// Upscale to a resolution preset, then enhance.
    fn upscale(&self, params: &UpscaleParams) -> Result<Rendered, BackendError>;

    /// Re-encode in another format.
    fn convert(&self, params: &ConvertParams) -> Result<Rendered, BackendError>;
}

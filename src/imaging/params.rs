//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides where results go and with which settings) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 95). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters (sigma + threshold).
//! - [`CropRegion`]: A pixel rectangle; [`CropRequest`] is the unclamped user input.
//! - [`CropStyle`]: Smart-crop variants (`square`, `portrait`, `landscape`, `smart`, passthrough).
//! - [`OutputFormat`]: Target encodings for format conversion.
//! - [`Resolution`]: Upscale presets for resolution enhancement.
//! - `*Params`: Full specification for one backend call: source, output, settings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// The sharpening stage of the enhancement chain: Gaussian sigma 2.0,
    /// threshold 3. `imageops::unsharpen` adds the full difference to the
    /// blur (100% strength); there is no separate amount parameter.
    pub fn standard() -> Self {
        Self {
            sigma: 2.0,
            threshold: 3,
        }
    }

    /// Light sharpening applied between upscale steps.
    pub fn light() -> Self {
        Self {
            sigma: 0.8,
            threshold: 2,
        }
    }
}

/// A rectangle of pixels inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole image as a region.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A crop as requested by a caller, before clamping.
///
/// Coordinates and sizes may be negative or exceed the image; see
/// [`clamp_crop_region`](super::calculations::clamp_crop_region).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRequest {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Smart-crop variants.
///
/// Unrecognized style names parse to [`CropStyle::Passthrough`], which keeps
/// the full frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropStyle {
    /// Largest centered square.
    Square,
    /// Centered 9:16.
    Portrait,
    /// Centered 16:9.
    Landscape,
    /// Trim a 10% margin from every edge.
    Smart,
    /// Any other style name; the image is re-encoded unchanged.
    Passthrough(String),
}

impl CropStyle {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "square" => Self::Square,
            "portrait" => Self::Portrait,
            "landscape" => Self::Landscape,
            "smart" => Self::Smart,
            _ => Self::Passthrough(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Square => "square",
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
            Self::Smart => "smart",
            Self::Passthrough(name) => name,
        }
    }
}

impl fmt::Display for CropStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Target encodings for format conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    /// The rejected name, as given.
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            _ => Err(s.to_string()),
        }
    }
}

/// Resolution presets for [`enhance_resolution`](super::operations::enhance_resolution).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Hd720,
    Hd1080,
    Uhd4k,
    Uhd8k,
    /// Twice the source dimensions.
    Double,
}

impl Resolution {
    pub const ALL: [Resolution; 5] = [
        Self::Uhd8k,
        Self::Uhd4k,
        Self::Hd1080,
        Self::Hd720,
        Self::Double,
    ];

    /// The bounding box to fit the source into.
    pub fn target_box(self, source: (u32, u32)) -> (u32, u32) {
        match self {
            Self::Hd720 => (1280, 720),
            Self::Hd1080 => (1920, 1080),
            Self::Uhd4k => (3840, 2160),
            Self::Uhd8k => (7680, 4320),
            Self::Double => (source.0.saturating_mul(2), source.1.saturating_mul(2)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Hd720 => "720p",
            Self::Hd1080 => "1080p",
            Self::Uhd4k => "4k",
            Self::Uhd8k => "8k",
            Self::Double => "original",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

/// Parameters for an aspect-preserving resize. `width`/`height` are the
/// final, already-fitted dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Parameters for a smart crop. The region is computed by the backend once
/// the source dimensions are known.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartCropParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub style: CropStyle,
    pub quality: Quality,
}

/// Parameters for a fixed-region crop.
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub request: CropRequest,
    pub quality: Quality,
}

/// Parameters for the corner-color background removal heuristic.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveBackgroundParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Per-channel distance below which a pixel counts as background.
    pub threshold: u8,
}

/// Parameters for gradient background generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateBackgroundParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Weight of the source in the opaque-source blend (0.0–1.0).
    pub blend_weight: f32,
    pub quality: Quality,
}

/// Parameters for the fixed enhancement preset.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub quality: Quality,
}

/// Parameters for upscale + enhance.
#[derive(Debug, Clone, PartialEq)]
pub struct UpscaleParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub resolution: Resolution,
    pub quality: Quality,
}

/// Parameters for a format conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    /// Used for JPEG targets only; PNG and WebP are lossless.
    pub quality: Quality,
}

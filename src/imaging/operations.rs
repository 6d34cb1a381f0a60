//! High-level image operations.
//!
//! These functions combine calculations with backend execution. Each one
//! takes the backend, the [`OutputSettings`] for this run and a source path,
//! picks a fresh output name, calls the backend and returns the path that was
//! written. Backend failures are wrapped in [`ImageProcessingError`] together
//! with the operation that raised them.

use super::backend::{BackendError, ImageBackend, ImageInfo, Rendered};
use super::calculations::calculate_fit_dimensions;
use super::params::{
    ConvertParams, CropParams, CropRequest, CropStyle, EnhanceParams, GenerateBackgroundParams,
    OutputFormat, Quality, RemoveBackgroundParams, ResizeParams, Resolution, SmartCropParams,
    UpscaleParams,
};
use crate::naming::generate_output_name;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

/// Which public operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Resize,
    Crop,
    SmartCrop,
    RemoveBackground,
    GenerateBackground,
    EnhanceQuality,
    EnhanceResolution,
    ConvertFormat,
    ImageInfo,
}

impl OperationKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Crop => "crop",
            Self::SmartCrop => "smart_crop",
            Self::RemoveBackground => "remove_background",
            Self::GenerateBackground => "generate_background",
            Self::EnhanceQuality => "enhance_quality",
            Self::EnhanceResolution => "enhance_resolution",
            Self::ConvertFormat => "convert_format",
            Self::ImageInfo => "image_info",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The one error every operation returns.
#[derive(Error, Debug)]
#[error("{operation} failed: {source}")]
pub struct ImageProcessingError {
    pub operation: OperationKind,
    #[source]
    pub source: BackendError,
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImageProcessingError>;

/// Where outputs go and how they are encoded.
///
/// Built from [`Config`](crate::config::Config); passed explicitly so tests
/// can point each run at its own temporary directory.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub output_dir: PathBuf,
    pub resize_quality: Quality,
    pub crop_quality: Quality,
    /// Quality for generated-background JPEGs.
    pub background_quality: Quality,
    /// Quality for enhancement and resolution-enhancement JPEGs.
    pub enhance_quality: Quality,
    /// Quality for `convert_format` when the target is JPEG.
    pub jpeg_quality: Quality,
    /// Per-channel distance below which a pixel counts as background.
    pub background_threshold: u8,
    /// Share of the source in a generated-background blend.
    pub blend_weight: f32,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("processed"),
            resize_quality: Quality::new(95),
            crop_quality: Quality::new(95),
            background_quality: Quality::new(95),
            enhance_quality: Quality::new(98),
            jpeg_quality: Quality::new(95),
            background_threshold: 50,
            blend_weight: 0.7,
        }
    }
}

impl OutputSettings {
    /// Default settings writing into `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Create the output directory if needed and pick a fresh path inside it.
    fn next_output(&self, prefix: &str, extension: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(self
            .output_dir
            .join(generate_output_name(prefix, extension)))
    }
}

/// Shared wrapper: allocate the output path, run the transform, log the
/// outcome and tag any failure with `operation`.
fn execute(
    operation: OperationKind,
    settings: &OutputSettings,
    source: &Path,
    prefix: &str,
    extension: &str,
    transform: impl FnOnce(PathBuf) -> std::result::Result<Rendered, BackendError>,
) -> Result<PathBuf> {
    let started = Instant::now();
    debug!(%operation, source = %source.display(), "starting");

    let outcome = settings
        .next_output(prefix, extension)
        .map_err(BackendError::from)
        .and_then(|output| transform(output.clone()).map(|rendered| (output, rendered)));

    match outcome {
        Ok((output, rendered)) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            info!(
                %operation,
                source = %source.display(),
                output = %output.display(),
                width = rendered.width,
                height = rendered.height,
                elapsed_ms,
                "image written"
            );
            Ok(output)
        }
        Err(err) => Err(fail(operation, source, err)),
    }
}

fn fail(operation: OperationKind, source: &Path, err: BackendError) -> ImageProcessingError {
    error!(%operation, source = %source.display(), error = %err, "image processing failed");
    ImageProcessingError {
        operation,
        source: err,
    }
}

/// Scale to fit inside `width`×`height`, preserving aspect ratio. JPEG.
pub fn resize(
    backend: &impl ImageBackend,
    settings: &OutputSettings,
    source: &Path,
    width: u32,
    height: u32,
) -> Result<PathBuf> {
    let operation = OperationKind::Resize;
    if width == 0 || height == 0 {
        return Err(fail(
            operation,
            source,
            BackendError::InvalidRequest(format!(
                "target box must be positive, got {width}x{height}"
            )),
        ));
    }

    execute(operation, settings, source, "resized", "jpg", |output| {
        let dims = backend.identify(source)?;
        let (fit_w, fit_h) = calculate_fit_dimensions((dims.width, dims.height), (width, height));
        backend.resize(&ResizeParams {
            source: source.to_path_buf(),
            output,
            width: fit_w,
            height: fit_h,
            quality: settings.resize_quality,
        })
    })
}

/// Extract a rectangle, clamped to the image bounds. JPEG.
pub fn crop(
    backend: &impl ImageBackend,
    settings: &OutputSettings,
    source: &Path,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
) -> Result<PathBuf> {
    execute(
        OperationKind::Crop,
        settings,
        source,
        "cropped",
        "jpg",
        |output| {
            backend.crop(&CropParams {
                source: source.to_path_buf(),
                output,
                request: CropRequest {
                    x,
                    y,
                    width,
                    height,
                },
                quality: settings.crop_quality,
            })
        },
    )
}

/// Crop by style name (`square`, `portrait`, `landscape`, `smart`); any
/// other name keeps the full frame. JPEG, prefixed `cropped_{style}`.
pub fn smart_crop(
    backend: &impl ImageBackend,
    settings: &OutputSettings,
    source: &Path,
    style: &str,
) -> Result<PathBuf> {
    let style = CropStyle::parse(style);
    let prefix = format!("cropped_{}", style.name());
    execute(
        OperationKind::SmartCrop,
        settings,
        source,
        &prefix,
        "jpg",
        |output| {
            backend.smart_crop(&SmartCropParams {
                source: source.to_path_buf(),
                output,
                style: style.clone(),
                quality: settings.crop_quality,
            })
        },
    )
}

/// Make pixels close to the top-left corner color transparent. PNG.
pub fn remove_background(
    backend: &impl ImageBackend,
    settings: &OutputSettings,
    source: &Path,
) -> Result<PathBuf> {
    execute(
        OperationKind::RemoveBackground,
        settings,
        source,
        "bg_removed",
        "png",
        |output| {
            backend.remove_background(&RemoveBackgroundParams {
                source: source.to_path_buf(),
                output,
                threshold: settings.background_threshold,
            })
        },
    )
}

/// Place the source over a synthetic gradient. JPEG.
pub fn generate_background(
    backend: &impl ImageBackend,
    settings: &OutputSettings,
    source: &Path,
) -> Result<PathBuf> {
    execute(
        OperationKind::GenerateBackground,
        settings,
        source,
        "bg_generated",
        "jpg",
        |output| {
            backend.generate_background(&GenerateBackgroundParams {
                source: source.to_path_buf(),
                output,
                blend_weight: settings.blend_weight,
                quality: settings.background_quality,
            })
        },
    )
}

/// Sharpen, then boost contrast, color and brightness. JPEG.
pub fn enhance_quality(
    backend: &impl ImageBackend,
    settings: &OutputSettings,
    source: &Path,
) -> Result<PathBuf> {
    execute(
        OperationKind::EnhanceQuality,
        settings,
        source,
        "enhanced",
        "jpg",
        |output| {
            backend.enhance(&EnhanceParams {
                source: source.to_path_buf(),
                output,
                quality: settings.enhance_quality,
            })
        },
    )
}

/// Upscale to a preset (`720p`, `1080p`, `4k`, `8k`, `original`) and
/// enhance. Unknown presets fail before anything is written.
pub fn enhance_resolution(
    backend: &impl ImageBackend,
    settings: &OutputSettings,
    source: &Path,
    preset: &str,
) -> Result<PathBuf> {
    let operation = OperationKind::EnhanceResolution;
    let resolution: Resolution = preset
        .parse()
        .map_err(|name| fail(operation, source, BackendError::UnsupportedResolution(name)))?;

    let prefix = format!("enhanced_{}", resolution.name());
    execute(operation, settings, source, &prefix, "jpg", |output| {
        backend.upscale(&UpscaleParams {
            source: source.to_path_buf(),
            output,
            resolution,
            quality: settings.enhance_quality,
        })
    })
}

/// Re-encode as `jpeg`/`jpg`, `png` or `webp` (case-insensitive).
/// Unknown formats fail before anything is written.
pub fn convert_format(
    backend: &impl ImageBackend,
    settings: &OutputSettings,
    source: &Path,
    target_format: &str,
) -> Result<PathBuf> {
    let operation = OperationKind::ConvertFormat;
    let format: OutputFormat = target_format
        .parse()
        .map_err(|name| fail(operation, source, BackendError::UnsupportedFormat(name)))?;

    let prefix = format!("converted_{}", format.name());
    execute(
        operation,
        settings,
        source,
        &prefix,
        format.extension(),
        |output| {
            backend.convert(&ConvertParams {
                source: source.to_path_buf(),
                output,
                format,
                quality: settings.jpeg_quality,
            })
        },
    )
}

/// Describe a source image without writing anything.
pub fn image_info(backend: &impl ImageBackend, source: &Path) -> Result<ImageInfo> {
    backend
        .info(source)
        .map_err(|err| fail(OperationKind::ImageInfo, source, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::naming::parse_output_name;
    use tempfile::TempDir;

    fn settings(tmp: &TempDir) -> OutputSettings {
        OutputSettings::in_dir(tmp.path().join("out"))
    }

    fn prefix_of(path: &Path) -> String {
        let name = path.file_name().unwrap().to_str().unwrap();
        parse_output_name(name).unwrap().prefix
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    // =========================================================================
    // resize
    // =========================================================================

    #[test]
    fn resize_fits_landscape_into_box() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 4000,
            height: 3000,
        }]);

        let out = resize(
            &backend,
            &settings(&tmp),
            Path::new("/in.jpg"),
            1920,
            1080,
        )
        .unwrap();

        assert_eq!(prefix_of(&out), "resized");
        assert_eq!(out.extension().unwrap(), "jpg");
        assert!(out.starts_with(tmp.path().join("out")));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::Identify(_)));
        assert!(matches!(
            &ops[1],
            RecordedOp::Resize {
                width: 1440,
                height: 1080,
                quality: 95,
                ..
            }
        ));
    }

    #[test]
    fn resize_creates_output_dir() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 100,
            height: 100,
        }]);
        let s = settings(&tmp);
        assert!(!s.output_dir.exists());

        resize(&backend, &s, Path::new("/in.jpg"), 50, 50).unwrap();
        assert!(s.output_dir.is_dir());
    }

    #[test]
    fn resize_rejects_zero_box() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let err = resize(&backend, &settings(&tmp), Path::new("/in.jpg"), 0, 100).unwrap_err();
        assert_eq!(err.operation, OperationKind::Resize);
        assert!(matches!(err.source, BackendError::InvalidRequest(_)));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn resize_decode_failure_is_tagged() {
        let tmp = TempDir::new().unwrap();
        // No mock dimensions queued: identify fails.
        let backend = MockBackend::new();

        let err = resize(&backend, &settings(&tmp), Path::new("/in.jpg"), 10, 10).unwrap_err();
        assert_eq!(err.operation, OperationKind::Resize);
        assert!(matches!(err.source, BackendError::Decode { .. }));
        assert!(err.to_string().starts_with("resize failed: "));
    }

    // =========================================================================
    // crop family
    // =========================================================================

    #[test]
    fn crop_forwards_raw_request() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let out = crop(
            &backend,
            &settings(&tmp),
            Path::new("/in.jpg"),
            -10,
            20,
            5000,
            300,
        )
        .unwrap();
        assert_eq!(prefix_of(&out), "cropped");

        let ops = backend.get_operations();
        assert_eq!(
            ops[0],
            RecordedOp::Crop {
                output: out.to_string_lossy().to_string(),
                x: -10,
                y: 20,
                width: 5000,
                height: 300,
            }
        );
    }

    #[test]
    fn smart_crop_prefix_names_style() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let out = smart_crop(&backend, &settings(&tmp), Path::new("/in.jpg"), "Square").unwrap();
        assert_eq!(prefix_of(&out), "cropped_square");

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::SmartCrop {
                style: CropStyle::Square,
                ..
            }
        ));
    }

    #[test]
    fn smart_crop_unknown_style_passes_through() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let out = smart_crop(&backend, &settings(&tmp), Path::new("/in.jpg"), "circle").unwrap();
        assert_eq!(prefix_of(&out), "cropped_circle");
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::SmartCrop {
                style: CropStyle::Passthrough(name),
                ..
            } if name == "circle"
        ));
    }

    // =========================================================================
    // background
    // =========================================================================

    #[test]
    fn remove_background_writes_png_with_configured_threshold() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let s = OutputSettings {
            background_threshold: 30,
            ..settings(&tmp)
        };

        let out = remove_background(&backend, &s, Path::new("/in.jpg")).unwrap();
        assert_eq!(prefix_of(&out), "bg_removed");
        assert_eq!(out.extension().unwrap(), "png");
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::RemoveBackground { threshold: 30, .. }
        ));
    }

    #[test]
    fn generate_background_uses_blend_weight() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let out = generate_background(&backend, &settings(&tmp), Path::new("/in.png")).unwrap();
        assert_eq!(prefix_of(&out), "bg_generated");
        assert_eq!(out.extension().unwrap(), "jpg");
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::GenerateBackground { blend_weight, quality: 95, .. } if (*blend_weight - 0.7).abs() < f32::EPSILON
        ));
    }

    // =========================================================================
    // enhancement
    // =========================================================================

    #[test]
    fn enhance_quality_uses_quality_98() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let out = enhance_quality(&backend, &settings(&tmp), Path::new("/in.jpg")).unwrap();
        assert_eq!(prefix_of(&out), "enhanced");
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Enhance { quality: 98, .. }
        ));
    }

    #[test]
    fn enhance_resolution_prefix_names_preset() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let out =
            enhance_resolution(&backend, &settings(&tmp), Path::new("/in.jpg"), "4K").unwrap();
        assert_eq!(prefix_of(&out), "enhanced_4k");
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Upscale {
                resolution: Resolution::Uhd4k,
                ..
            }
        ));
    }

    #[test]
    fn enhance_resolution_rejects_unknown_preset() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let s = settings(&tmp);

        let err = enhance_resolution(&backend, &s, Path::new("/in.jpg"), "16k").unwrap_err();
        assert_eq!(err.operation, OperationKind::EnhanceResolution);
        assert!(matches!(err.source, BackendError::UnsupportedResolution(ref p) if p == "16k"));
        assert!(backend.get_operations().is_empty());
        assert_eq!(files_in(&s.output_dir), 0);
    }

    // =========================================================================
    // conversion
    // =========================================================================

    #[test]
    fn convert_extension_matches_format() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let s = settings(&tmp);

        for (name, ext, prefix) in [
            ("JPEG", "jpg", "converted_jpeg"),
            ("jpg", "jpg", "converted_jpeg"),
            ("png", "png", "converted_png"),
            ("WebP", "webp", "converted_webp"),
        ] {
            let out = convert_format(&backend, &s, Path::new("/in.png"), name).unwrap();
            assert_eq!(out.extension().unwrap(), ext);
            assert_eq!(prefix_of(&out), prefix);
        }
        assert_eq!(backend.get_operations().len(), 4);
    }

    #[test]
    fn convert_unsupported_format_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let s = settings(&tmp);

        let err = convert_format(&backend, &s, Path::new("/in.png"), "bmp").unwrap_err();
        assert_eq!(err.operation, OperationKind::ConvertFormat);
        assert!(matches!(err.source, BackendError::UnsupportedFormat(ref f) if f == "bmp"));
        assert_eq!(
            err.to_string(),
            "convert_format failed: unsupported format: bmp"
        );
        assert!(backend.get_operations().is_empty());
        assert_eq!(files_in(&s.output_dir), 0);
    }

    // =========================================================================
    // info + failures
    // =========================================================================

    #[test]
    fn image_info_reports_dimensions() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 640,
            height: 480,
        }]);
        let info = image_info(&backend, Path::new("/in.jpg")).unwrap();
        assert_eq!((info.width, info.height), (640, 480));
    }

    #[test]
    fn image_info_failure_is_tagged() {
        let backend = MockBackend::new();
        let err = image_info(&backend, Path::new("/missing.jpg")).unwrap_err();
        assert_eq!(err.operation, OperationKind::ImageInfo);
    }

    #[test]
    fn backend_failure_names_the_operation() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::failing();
        let s = settings(&tmp);

        let err = generate_background(&backend, &s, Path::new("/in.jpg")).unwrap_err();
        assert_eq!(err.operation, OperationKind::GenerateBackground);
        assert_eq!(
            err.to_string(),
            "generate_background failed: failed to decode /in.jpg: mock failure"
        );
    }

    #[test]
    fn operation_names_are_snake_case() {
        assert_eq!(OperationKind::SmartCrop.to_string(), "smart_crop");
        assert_eq!(OperationKind::ConvertFormat.to_string(), "convert_format");
        assert_eq!(OperationKind::ImageInfo.to_string(), "image_info");
    }
}

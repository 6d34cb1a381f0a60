//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::ImageReader` with content sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Crop / smart crop | `DynamicImage::crop_imm` over a computed [`CropRegion`] |
//! | Background removal / generation | [`effects`](super::effects) (rayon over raw samples) |
//! | Enhancement | `imageops::unsharpen` + [`effects`](super::effects) adjustments |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG | `PngEncoder` (best compression, adaptive filter) |
//! | Encode → WebP | `WebPEncoder::new_lossless` (the only pure-Rust WebP encoder) |

use super::backend::{BackendError, Dimensions, ImageBackend, ImageInfo, Rendered};
use super::calculations::{
    aspect_ratio, calculate_fit_dimensions, calculate_smart_crop_region, calculate_upscale_steps,
    clamp_crop_region, minimal_region,
};
use super::effects;
use super::params::{
    ConvertParams, CropParams, CropRegion, EnhanceParams, GenerateBackgroundParams, OutputFormat,
    Quality, RemoveBackgroundParams, ResizeParams, SmartCropParams, UpscaleParams,
};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, warn};

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Open a reader that trusts file contents over the extension; chat
/// downloads often arrive with a generic name.
fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<File>>, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let img = open_reader(path)?
        .decode()
        .map_err(|e| decode_error(path, e))?;
    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        "decoded source"
    );
    Ok(img)
}

/// Normalize the pixel layout for an encoder: JPEG gets plain RGB, WebP an
/// 8-bit layout keeping alpha when present. PNG takes every integer layout
/// as decoded, so 16-bit samples and alpha survive untouched; only float
/// buffers are narrowed to 16 bits.
fn prepare_for(img: DynamicImage, format: OutputFormat) -> DynamicImage {
    let alpha = img.color().has_alpha();
    match format {
        OutputFormat::Png => match img {
            DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb16(img.to_rgb16()),
            DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba16(img.to_rgba16()),
            other => other,
        },
        OutputFormat::WebP if alpha => match img {
            DynamicImage::ImageRgba8(_) => img,
            other => DynamicImage::ImageRgba8(other.to_rgba8()),
        },
        OutputFormat::Jpeg | OutputFormat::WebP => match img {
            DynamicImage::ImageRgb8(_) => img,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        },
    }
}

/// Encode and write `img` to `path`.
///
/// A failed encode removes whatever was written so no truncated file is
/// left behind in the output directory.
fn save_image(
    img: DynamicImage,
    path: &Path,
    format: OutputFormat,
    quality: Quality,
) -> Result<Rendered, BackendError> {
    let img = prepare_for(img, format);
    let rendered = Rendered {
        width: img.width(),
        height: img.height(),
    };

    let file = File::create(path).map_err(BackendError::Io)?;
    let writer = BufWriter::new(file);
    let result = match format {
        OutputFormat::Jpeg => {
            img.write_with_encoder(JpegEncoder::new_with_quality(writer, quality.value()))
        }
        OutputFormat::Png => img.write_with_encoder(PngEncoder::new_with_quality(
            writer,
            CompressionType::Best,
            PngFilter::Adaptive,
        )),
        OutputFormat::WebP => img.write_with_encoder(WebPEncoder::new_lossless(writer)),
    };

    if let Err(e) = result {
        if let Err(remove_err) = std::fs::remove_file(path) {
            warn!(path = %path.display(), "could not remove partial output: {remove_err}");
        }
        return Err(BackendError::Encode {
            path: path.to_path_buf(),
            message: e.to_string(),
        });
    }
    Ok(rendered)
}

fn crop_to(img: &DynamicImage, region: CropRegion) -> DynamicImage {
    img.crop_imm(region.x, region.y, region.width, region.height)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = open_reader(path)?
            .into_dimensions()
            .map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn info(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        let reader = open_reader(path)?;
        let format = reader.format().map(|f| format!("{f:?}").to_lowercase());
        let img = reader.decode().map_err(|e| decode_error(path, e))?;
        Ok(ImageInfo {
            format,
            color: format!("{:?}", img.color()).to_lowercase(),
            width: img.width(),
            height: img.height(),
            aspect_ratio: aspect_ratio((img.width(), img.height())),
        })
    }

    fn resize(&self, params: &ResizeParams) -> Result<Rendered, BackendError> {
        let img = DynamicImage::ImageRgb8(load_image(&params.source)?.to_rgb8());
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(resized, &params.output, OutputFormat::Jpeg, params.quality)
    }

    fn crop(&self, params: &CropParams) -> Result<Rendered, BackendError> {
        let img = load_image(&params.source)?;
        let dims = (img.width(), img.height());
        let mut region = clamp_crop_region(dims, params.request);
        if region.is_empty() {
            region = minimal_region(dims, region)
                .ok_or_else(|| decode_error(&params.source, "image has no pixels"))?;
            debug!(?region, "zero-area crop widened to a single pixel");
        }
        save_image(
            crop_to(&img, region),
            &params.output,
            OutputFormat::Jpeg,
            params.quality,
        )
    }

    fn smart_crop(&self, params: &SmartCropParams) -> Result<Rendered, BackendError> {
        let img = load_image(&params.source)?;
        let region = calculate_smart_crop_region((img.width(), img.height()), &params.style);
        save_image(
            crop_to(&img, region),
            &params.output,
            OutputFormat::Jpeg,
            params.quality,
        )
    }

    fn remove_background(
        &self,
        params: &RemoveBackgroundParams,
    ) -> Result<Rendered, BackendError> {
        let img = load_image(&params.source)?;
        let cut = effects::remove_background(&img, params.threshold);
        save_image(
            DynamicImage::ImageRgba8(cut),
            &params.output,
            OutputFormat::Png,
            Quality::default(),
        )
    }

    fn generate_background(
        &self,
        params: &GenerateBackgroundParams,
    ) -> Result<Rendered, BackendError> {
        let img = load_image(&params.source)?;
        let composed = effects::compose_on_gradient(&img, params.blend_weight);
        save_image(
            DynamicImage::ImageRgb8(composed),
            &params.output,
            OutputFormat::Jpeg,
            params.quality,
        )
    }

    fn enhance(&self, params: &EnhanceParams) -> Result<Rendered, BackendError> {
        let img = load_image(&params.source)?;
        save_image(
            DynamicImage::ImageRgb8(effects::enhance(&img)),
            &params.output,
            OutputFormat::Jpeg,
            params.quality,
        )
    }

    fn upscale(&self, params: &UpscaleParams) -> Result<Rendered, BackendError> {
        let img = load_image(&params.source)?;
        let dims = (img.width(), img.height());
        let target = calculate_fit_dimensions(dims, params.resolution.target_box(dims));
        let steps = calculate_upscale_steps(dims, target);
        debug!(?dims, ?target, steps = steps.len(), "planned upscale");

        let scaled = DynamicImage::ImageRgb8(effects::upscale_in_steps(&img, &steps));
        save_image(
            DynamicImage::ImageRgb8(effects::enhance(&scaled)),
            &params.output,
            OutputFormat::Jpeg,
            params.quality,
        )
    }

    fn convert(&self, params: &ConvertParams) -> Result<Rendered, BackendError> {
        let img = load_image(&params.source)?;
        save_image(img, &params.output, params.format, params.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{CropRequest, CropStyle, Resolution};
    use image::{ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
    use std::path::PathBuf;

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    /// Half-transparent RGBA PNG.
    fn create_test_rgba_png(path: &Path, width: u32, height: u32) {
        RgbaImage::from_fn(width, height, |x, _| {
            Rgba([200, 40, 40, if x < width / 2 { 255 } else { 0 }])
        })
        .save(path)
        .unwrap();
    }

    fn setup(name: &str, width: u32, height: u32) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(name);
        create_test_jpeg(&path, width, height);
        (tmp, path)
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let (_tmp, path) = setup("test.jpg", 200, 150);
        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims, Dimensions { width: 200, height: 150 });
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn decode_garbage_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("not-an-image.jpg");
        std::fs::write(&path, b"definitely not pixels").unwrap();
        let result = RustBackend::new().enhance(&EnhanceParams {
            source: path,
            output: tmp.path().join("out.jpg"),
            quality: Quality::new(98),
        });
        assert!(matches!(result, Err(BackendError::Decode { .. })));
        assert!(!tmp.path().join("out.jpg").exists());
    }

    #[test]
    fn info_reports_format_and_layout() {
        let (_tmp, path) = setup("photo.bin", 320, 180);
        let info = RustBackend::new().info(&path).unwrap();
        assert_eq!(info.format.as_deref(), Some("jpeg"));
        assert_eq!(info.color, "rgb8");
        assert_eq!((info.width, info.height), (320, 180));
        assert_eq!(info.aspect_ratio, 1.78);
    }

    #[test]
    fn resize_writes_exact_dimensions() {
        let (tmp, source) = setup("source.jpg", 400, 300);
        let output = tmp.path().join("resized.jpg");
        let rendered = RustBackend::new()
            .resize(&ResizeParams {
                source,
                output: output.clone(),
                width: 200,
                height: 150,
                quality: Quality::new(95),
            })
            .unwrap();
        assert_eq!(rendered, Rendered { width: 200, height: 150 });
        assert_eq!(image::image_dimensions(&output).unwrap(), (200, 150));
    }

    #[test]
    fn resize_flattens_alpha_sources() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("alpha.png");
        create_test_rgba_png(&source, 64, 32);
        let output = tmp.path().join("resized.jpg");
        RustBackend::new()
            .resize(&ResizeParams {
                source,
                output: output.clone(),
                width: 32,
                height: 16,
                quality: Quality::new(95),
            })
            .unwrap();
        let decoded = image::open(&output).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let (tmp, source) = setup("source.jpg", 100, 80);
        let output = tmp.path().join("crop.jpg");
        RustBackend::new()
            .crop(&CropParams {
                source,
                output: output.clone(),
                request: CropRequest {
                    x: 60,
                    y: -20,
                    width: 500,
                    height: 50,
                },
                quality: Quality::new(95),
            })
            .unwrap();
        assert_eq!(image::image_dimensions(&output).unwrap(), (40, 50));
    }

    #[test]
    fn crop_zero_area_yields_single_pixel() {
        let (tmp, source) = setup("source.jpg", 100, 80);
        let output = tmp.path().join("crop.jpg");
        let rendered = RustBackend::new()
            .crop(&CropParams {
                source,
                output: output.clone(),
                request: CropRequest {
                    x: 500,
                    y: 500,
                    width: 10,
                    height: 10,
                },
                quality: Quality::new(95),
            })
            .unwrap();
        assert_eq!(rendered, Rendered { width: 1, height: 1 });
        assert!(output.exists());
    }

    #[test]
    fn smart_crop_square_dimensions() {
        let (tmp, source) = setup("source.jpg", 300, 200);
        let output = tmp.path().join("square.jpg");
        RustBackend::new()
            .smart_crop(&SmartCropParams {
                source,
                output: output.clone(),
                style: CropStyle::Square,
                quality: Quality::new(95),
            })
            .unwrap();
        assert_eq!(image::image_dimensions(&output).unwrap(), (200, 200));
    }

    #[test]
    fn remove_background_writes_transparent_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("subject.png");
        RgbImage::from_fn(20, 20, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) {
                Rgb([10, 10, 200])
            } else {
                Rgb([240, 240, 240])
            }
        })
        .save(&source)
        .unwrap();

        let output = tmp.path().join("cut.png");
        RustBackend::new()
            .remove_background(&RemoveBackgroundParams {
                source,
                output: output.clone(),
                threshold: 50,
            })
            .unwrap();

        let decoded = image::open(&output).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
        assert_eq!(decoded.get_pixel(19, 0).0[3], 0);
        assert_eq!(decoded.get_pixel(10, 10).0, [10, 10, 200, 255]);
    }

    #[test]
    fn generate_background_is_opaque_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("alpha.png");
        create_test_rgba_png(&source, 40, 30);
        let output = tmp.path().join("bg.jpg");
        RustBackend::new()
            .generate_background(&GenerateBackgroundParams {
                source,
                output: output.clone(),
                blend_weight: 0.7,
                quality: Quality::new(95),
            })
            .unwrap();
        let decoded = image::open(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn upscale_fits_preset_box() {
        let (tmp, source) = setup("small.jpg", 160, 90);
        let output = tmp.path().join("up.jpg");
        RustBackend::new()
            .upscale(&UpscaleParams {
                source,
                output: output.clone(),
                resolution: Resolution::Hd720,
                quality: Quality::new(98),
            })
            .unwrap();
        assert_eq!(image::image_dimensions(&output).unwrap(), (1280, 720));
    }

    #[test]
    fn convert_rgba_to_jpeg_drops_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("alpha.png");
        create_test_rgba_png(&source, 16, 16);
        let output = tmp.path().join("out.jpg");
        RustBackend::new()
            .convert(&ConvertParams {
                source,
                output: output.clone(),
                format: OutputFormat::Jpeg,
                quality: Quality::new(95),
            })
            .unwrap();
        let decoded = image::open(&output).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn convert_rgba_to_png_preserves_alpha_exactly() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("alpha.png");
        create_test_rgba_png(&source, 16, 16);
        let output = tmp.path().join("out.png");
        RustBackend::new()
            .convert(&ConvertParams {
                source: source.clone(),
                output: output.clone(),
                format: OutputFormat::Png,
                quality: Quality::new(95),
            })
            .unwrap();
        let original = image::open(&source).unwrap().to_rgba8();
        let converted = image::open(&output).unwrap().to_rgba8();
        assert_eq!(original, converted);
    }

    #[test]
    fn convert_16bit_rgba_to_png_keeps_full_depth() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("deep.png");
        let original: image::ImageBuffer<Rgba<u16>, Vec<u16>> =
            image::ImageBuffer::from_fn(4, 4, |x, y| {
                Rgba([0x0101 * (x as u16 + 1), 0x4321, 0x1000 * y as u16, 0x1234 + x as u16])
            });
        original.save(&source).unwrap();
        let output = tmp.path().join("out.png");
        RustBackend::new()
            .convert(&ConvertParams {
                source,
                output: output.clone(),
                format: OutputFormat::Png,
                quality: Quality::new(95),
            })
            .unwrap();
        let decoded = image::open(&output).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgba16);
        assert_eq!(decoded.to_rgba16(), original);
    }

    #[test]
    fn convert_to_webp_is_lossless() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("alpha.png");
        create_test_rgba_png(&source, 24, 12);
        let output = tmp.path().join("out.webp");
        RustBackend::new()
            .convert(&ConvertParams {
                source: source.clone(),
                output: output.clone(),
                format: OutputFormat::WebP,
                quality: Quality::new(95),
            })
            .unwrap();
        let original = image::open(&source).unwrap().to_rgba8();
        let converted = image::open(&output).unwrap().to_rgba8();
        assert_eq!(original.dimensions(), converted.dimensions());
        for (a, b) in original.pixels().zip(converted.pixels()) {
            assert_eq!(a.0[3], b.0[3]);
            if a.0[3] == 255 {
                assert_eq!(a, b);
            }
        }
    }
}

//! In-memory pixel transforms.
//!
//! Everything here works on decoded buffers and never touches the
//! filesystem, so the heuristics can be tested against synthetic images.
//! Per-pixel work runs over the raw sample slice in parallel with rayon
//! rather than through `get_pixel`/`put_pixel`.
//!
//! The enhancement adjustments follow the usual "blend toward a degenerate
//! image" model: contrast blends toward the mean gray level, color toward
//! the pixel's own luma, brightness toward black.

use super::calculations::gradient_color;
use super::params::Sharpening;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbImage, RgbaImage};
use rayon::prelude::*;

/// Contrast factor of the enhancement chain.
pub const CONTRAST_BOOST: f32 = 1.2;
/// Saturation factor of the enhancement chain.
pub const COLOR_BOOST: f32 = 1.1;
/// Brightness factor of the enhancement chain.
pub const BRIGHTNESS_BOOST: f32 = 1.05;

/// Make every pixel close to the top-left corner color fully transparent.
///
/// A pixel is background when each of its R, G and B channels differs from
/// the corner sample by less than `threshold`. Background pixels get alpha
/// 0, everything else alpha 255. Color channels are never modified.
pub fn remove_background(img: &DynamicImage, threshold: u8) -> RgbaImage {
    let mut rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return rgba;
    }

    let [bg_r, bg_g, bg_b, _] = rgba.get_pixel(0, 0).0;
    let samples: &mut [u8] = &mut rgba;
    samples.par_chunks_exact_mut(4).for_each(|px| {
        let is_background = px[0].abs_diff(bg_r) < threshold
            && px[1].abs_diff(bg_g) < threshold
            && px[2].abs_diff(bg_b) < threshold;
        px[3] = if is_background { 0 } else { 255 };
    });

    rgba
}

/// Build the synthetic diagonal gradient canvas.
pub fn gradient_canvas(width: u32, height: u32) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);
    let row_len = width as usize * 3;
    if row_len == 0 {
        return canvas;
    }

    let samples: &mut [u8] = &mut canvas;
    samples
        .par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                px.copy_from_slice(&gradient_color(x as u32, y as u32, width, height));
            }
        });

    canvas
}

/// Place the source over a gradient canvas of the same size.
///
/// Sources with an alpha channel are alpha-composited (the gradient shows
/// through transparent pixels). Opaque sources are blended linearly with
/// `blend_weight` going to the source and the rest to the gradient.
pub fn compose_on_gradient(img: &DynamicImage, blend_weight: f32) -> RgbImage {
    let (width, height) = img.dimensions();
    let mut canvas = gradient_canvas(width, height);
    let dst: &mut [u8] = &mut canvas;

    if img.color().has_alpha() {
        let src = img.to_rgba8();
        let src: &[u8] = &src;
        dst.par_chunks_exact_mut(3)
            .zip(src.par_chunks_exact(4))
            .for_each(|(bg, fg)| {
                let alpha = fg[3] as f32 / 255.0;
                for c in 0..3 {
                    bg[c] = mix(fg[c], bg[c], alpha);
                }
            });
    } else {
        let weight = blend_weight.clamp(0.0, 1.0);
        let src = img.to_rgb8();
        let src: &[u8] = &src;
        dst.par_iter_mut()
            .zip(src.par_iter())
            .for_each(|(bg, &fg)| *bg = mix(fg, *bg, weight));
    }

    canvas
}

/// `fg * weight + bg * (1 - weight)`, rounded.
#[inline]
fn mix(fg: u8, bg: u8, weight: f32) -> u8 {
    (fg as f32 * weight + bg as f32 * (1.0 - weight))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// ITU-R 601 luma in 16.16 fixed point.
#[inline]
fn luma(px: &[u8]) -> u8 {
    ((px[0] as u32 * 19595 + px[1] as u32 * 38470 + px[2] as u32 * 7471 + 0x8000) >> 16) as u8
}

#[inline]
fn blend_toward(sample: u8, degenerate: f32, factor: f32) -> u8 {
    (degenerate + factor * (sample as f32 - degenerate))
        .round()
        .clamp(0.0, 255.0) as u8
}

fn mean_luma(img: &RgbImage) -> f32 {
    let samples: &[u8] = img;
    let count = samples.len() / 3;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = samples
        .par_chunks_exact(3)
        .map(|px| u64::from(luma(px)))
        .sum();
    (sum as f64 / count as f64).round() as f32
}

/// Scale each sample's distance from the image's mean gray level.
pub fn adjust_contrast(mut img: RgbImage, factor: f32) -> RgbImage {
    let mean = mean_luma(&img);
    let samples: &mut [u8] = &mut img;
    samples
        .par_iter_mut()
        .for_each(|s| *s = blend_toward(*s, mean, factor));
    img
}

/// Scale each pixel's distance from its own gray value (saturation).
pub fn adjust_color(mut img: RgbImage, factor: f32) -> RgbImage {
    let samples: &mut [u8] = &mut img;
    samples.par_chunks_exact_mut(3).for_each(|px| {
        let gray = luma(px) as f32;
        for s in px.iter_mut() {
            *s = blend_toward(*s, gray, factor);
        }
    });
    img
}

/// Multiply every sample by `factor`.
pub fn adjust_brightness(mut img: RgbImage, factor: f32) -> RgbImage {
    let samples: &mut [u8] = &mut img;
    samples
        .par_iter_mut()
        .for_each(|s| *s = blend_toward(*s, 0.0, factor));
    img
}

/// The fixed enhancement chain. Order matters: each stage sees the previous
/// stage's output.
pub fn enhance(img: &DynamicImage) -> RgbImage {
    let sharpening = Sharpening::standard();
    let sharpened = imageops::unsharpen(&img.to_rgb8(), sharpening.sigma, sharpening.threshold);
    let contrasted = adjust_contrast(sharpened, CONTRAST_BOOST);
    let saturated = adjust_color(contrasted, COLOR_BOOST);
    adjust_brightness(saturated, BRIGHTNESS_BOOST)
}

/// Resize through each planned step with Lanczos3, lightly sharpening
/// between intermediate steps. Alpha is dropped up front.
pub fn upscale_in_steps(img: &DynamicImage, steps: &[(u32, u32)]) -> RgbImage {
    let light = Sharpening::light();
    let mut current = img.to_rgb8();
    for (i, &(width, height)) in steps.iter().enumerate() {
        current = imageops::resize(&current, width, height, FilterType::Lanczos3);
        if i + 1 < steps.len() {
            current = imageops::unsharpen(&current, light.sigma, light.threshold);
        }
    }
    current
}

//! Pure calculation functions for image geometry and synthesis.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{CropRegion, CropRequest, CropStyle};

/// Calculate dimensions that fit inside a bounding box while keeping the
/// source aspect ratio.
///
/// Exactly one output dimension equals the corresponding box dimension; the
/// other is rounded to the nearest pixel and never exceeds the box. Upscaling
/// is allowed: the box is a target, not a ceiling on the source.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Bounding box (width, height), both positive
///
/// # Examples
/// ```
/// # use photoedit::imaging::calculate_fit_dimensions;
/// // 4:3 into a square box → width-limited
/// assert_eq!(calculate_fit_dimensions((800, 600), (400, 400)), (400, 300));
///
/// // 3:4 into a square box → height-limited
/// assert_eq!(calculate_fit_dimensions((600, 800), (400, 400)), (300, 400));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = (target.0.max(1), target.1.max(1));

    let src_aspect = src_w.max(1) as f64 / src_h.max(1) as f64;
    let box_aspect = tgt_w as f64 / tgt_h as f64;

    if box_aspect > src_aspect {
        // Box is proportionally wider: height is the limit
        let w = (tgt_h as f64 * src_aspect).round() as u32;
        (w.clamp(1, tgt_w), tgt_h)
    } else {
        // Box is proportionally taller (or equal): width is the limit
        let h = (tgt_w as f64 / src_aspect).round() as u32;
        (tgt_w, h.clamp(1, tgt_h))
    }
}

/// Clamp a requested crop so it lies entirely within the image.
///
/// Coordinates are pinned to `[0, size]`, then width and height are reduced
/// to the remaining extent. The result may be zero-area when the request
/// starts at or past an edge.
pub fn clamp_crop_region(dims: (u32, u32), request: CropRequest) -> CropRegion {
    let (img_w, img_h) = (i64::from(dims.0), i64::from(dims.1));

    let x = request.x.clamp(0, img_w);
    let y = request.y.clamp(0, img_h);
    let width = request.width.clamp(0, img_w - x);
    let height = request.height.clamp(0, img_h - y);

    CropRegion::new(x as u32, y as u32, width as u32, height as u32)
}

/// Smallest non-empty stand-in for a zero-area region: one pixel at the
/// region's corner, pulled back inside the image.
///
/// Returns `None` for a zero-sized image.
pub fn minimal_region(dims: (u32, u32), region: CropRegion) -> Option<CropRegion> {
    if dims.0 == 0 || dims.1 == 0 {
        return None;
    }
    Some(CropRegion::new(
        region.x.min(dims.0 - 1),
        region.y.min(dims.1 - 1),
        1,
        1,
    ))
}

/// Calculate the region kept by a smart-crop style.
///
/// Centered trims use integer division, so odd leftovers are floored and the
/// extra pixel lands on the right/bottom edge.
pub fn calculate_smart_crop_region(dims: (u32, u32), style: &CropStyle) -> CropRegion {
    let (w, h) = dims;
    // u64 so cross-multiplied ratio checks can't overflow
    let (w64, h64) = (u64::from(w), u64::from(h));

    match style {
        CropStyle::Square => {
            let side = w.min(h);
            CropRegion::new((w - side) / 2, (h - side) / 2, side, side)
        }
        CropStyle::Portrait => {
            // 9:16 target
            if w64 * 16 > h64 * 9 {
                let new_w = ((h64 * 9 / 16) as u32).max(1).min(w);
                CropRegion::new((w - new_w) / 2, 0, new_w, h)
            } else {
                let new_h = ((w64 * 16 / 9) as u32).max(1).min(h);
                CropRegion::new(0, (h - new_h) / 2, w, new_h)
            }
        }
        CropStyle::Landscape => {
            // 16:9 target
            if w64 * 9 > h64 * 16 {
                let new_w = ((h64 * 16 / 9) as u32).max(1).min(w);
                CropRegion::new((w - new_w) / 2, 0, new_w, h)
            } else {
                let new_h = ((w64 * 9 / 16) as u32).max(1).min(h);
                CropRegion::new(0, (h - new_h) / 2, w, new_h)
            }
        }
        CropStyle::Smart => {
            let margin_x = w / 10;
            let margin_y = h / 10;
            CropRegion::new(margin_x, margin_y, w - 2 * margin_x, h - 2 * margin_y)
        }
        CropStyle::Passthrough(_) => CropRegion::full(w, h),
    }
}

/// Color of the synthetic background gradient at `(x, y)`.
///
/// Red runs 100→200 left to right, green 150→200 top to bottom, blue
/// 200→255 along the diagonal. Values are truncated, not rounded.
#[inline]
pub fn gradient_color(x: u32, y: u32, width: u32, height: u32) -> [u8; 3] {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let (fx, fy) = (x as f32, y as f32);

    let r = 100.0 + fx / w * 100.0;
    let g = 150.0 + fy / h * 50.0;
    let b = 200.0 + (fx + fy) / (w + h) * 55.0;

    [
        r.clamp(0.0, 255.0) as u8,
        g.clamp(0.0, 255.0) as u8,
        b.clamp(0.0, 255.0) as u8,
    ]
}

/// Plan the intermediate sizes for a large upscale.
///
/// When the overall scale factor exceeds 2, the source is doubled repeatedly
/// until one more step of at most 2× reaches the target. The returned list
/// always ends with `target`.
pub fn calculate_upscale_steps(source: (u32, u32), target: (u32, u32)) -> Vec<(u32, u32)> {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));
    let scale = (target.0 as f64 / src_w as f64).max(target.1 as f64 / src_h as f64);

    let mut steps = Vec::new();
    let mut current = (src_w, src_h);
    let mut current_scale = 1.0;
    while current_scale * 2.0 < scale {
        current = (current.0.saturating_mul(2), current.1.saturating_mul(2));
        current_scale *= 2.0;
        steps.push(current);
    }
    steps.push(target);
    steps
}

/// Width over height, rounded to two decimals.
pub fn aspect_ratio(dims: (u32, u32)) -> f64 {
    if dims.1 == 0 {
        return 0.0;
    }
    (dims.0 as f64 / dims.1 as f64 * 100.0).round() / 100.0
}

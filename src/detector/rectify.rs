use crate::models::{CandidateRegion, Point, RectifiedRoi};
use crate::utils::geometry::{PerspectiveTransform, min_area_rect};
use image::RgbImage;
use rayon::prelude::*;

/// Cut an upright ROI out of the photo from a candidate's bounding rectangle.
///
/// The rectangle corners are pixel centres, so the ROI measures
/// `round(width) + 1` x `round(height) + 1` pixels and samples the source at
/// its native pitch. Its corners map, clockwise from the top-left, to the
/// rectangle corners clockwise from the topmost one. Returns `None` when the
/// rectangle or the mapping is degenerate.
pub fn rectify(image: &RgbImage, candidate: &CandidateRegion) -> Option<RectifiedRoi> {
    let rect = min_area_rect(&candidate.corners)?;
    let out_w = rect.width.round() as u32 + 1;
    let out_h = rect.height.round() as u32 + 1;

    let (max_x, max_y) = ((out_w - 1) as f32, (out_h - 1) as f32);
    let dst = [
        Point::new(0.0, 0.0),
        Point::new(max_x, 0.0),
        Point::new(max_x, max_y),
        Point::new(0.0, max_y),
    ];
    // ROI -> photo, so every output pixel pulls from the source
    let transform = PerspectiveTransform::from_points(&dst, &rect.corners)?;

    Some(RectifiedRoi {
        image: warp_bilinear(image, &transform, out_w, out_h),
        source_corners: rect.corners,
        candidate: *candidate,
    })
}

/// Resample `image` through `transform` (output -> source) with bilinear weights.
///
/// Output pixels whose source position falls outside the photo are black.
pub fn warp_bilinear(
    image: &RgbImage,
    transform: &PerspectiveTransform,
    out_w: u32,
    out_h: u32,
) -> RgbImage {
    let row_len = out_w as usize * 3;
    let mut buf = vec![0u8; row_len * out_h as usize];
    if row_len > 0 {
        buf.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
            for (x, out) in row.chunks_exact_mut(3).enumerate() {
                if let Some((sx, sy)) = transform.apply(x as f64, y as f64) {
                    if let Some(px) = sample(image, sx, sy) {
                        out.copy_from_slice(&px);
                    }
                }
            }
        });
    }
    RgbImage::from_raw(out_w, out_h, buf).unwrap_or_else(|| RgbImage::new(out_w, out_h))
}

#[inline]
fn sample(image: &RgbImage, sx: f64, sy: f64) -> Option<[u8; 3]> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    // Half a pixel of slack absorbs rounding at the ROI corners
    if sx < -0.5 || sy < -0.5 || sx > w as f64 - 0.5 || sy > h as f64 - 0.5 {
        return None;
    }
    let sx = sx.clamp(0.0, (w - 1) as f64);
    let sy = sy.clamp(0.0, (h - 1) as f64);

    let x0 = sx.floor() as u32;
    let y0 = sy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = sx - x0 as f64;
    let fy = sy - y0 as f64;

    let p00 = image.get_pixel(x0, y0).0;
    let p10 = image.get_pixel(x1, y0).0;
    let p01 = image.get_pixel(x0, y1).0;
    let p11 = image.get_pixel(x1, y1).0;

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(out)
}

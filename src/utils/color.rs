//! RGB to HSV conversion and color-window masks.
//!
//! HSV follows the common 8-bit convention: hue is degrees halved (`0..=180`),
//! saturation and value span `0..=255`. Saturation and value do not depend on
//! channel order, so BGR and RGB sources agree on everything but hue.

use crate::config::MaskBounds;
use image::{GrayImage, RgbImage};
use rayon::prelude::*;

/// Convert one RGB pixel to 8-bit HSV
#[inline]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = (v - min) as i32;

    if v == 0 || diff == 0 {
        return (0, 0, v);
    }

    let vi = v as i32;
    let s = ((255 * diff + vi / 2) / vi) as u8;

    let (r, g, b) = (r as i32, g as i32, b as i32);
    let mut h = if vi == r {
        60.0 * (g - b) as f32 / diff as f32
    } else if vi == g {
        120.0 + 60.0 * (b - r) as f32 / diff as f32
    } else {
        240.0 + 60.0 * (r - g) as f32 / diff as f32
    };
    if h < 0.0 {
        h += 360.0;
    }
    let h = ((h / 2.0).round() as i32).clamp(0, 180) as u8;

    (h, s, v)
}

/// Binary mask (255 inside the window, 0 outside) of an RGB image
pub fn hsv_mask(image: &RgbImage, bounds: &MaskBounds) -> GrayImage {
    let (width, height) = image.dimensions();
    let w = width as usize;
    let mut mask = vec![0u8; w * height as usize];
    if w > 0 {
        let rgb = image.as_raw();
        mask.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            let src = &rgb[y * w * 3..(y + 1) * w * 3];
            for (out, px) in row.iter_mut().zip(src.chunks_exact(3)) {
                let (h, s, v) = rgb_to_hsv(px[0], px[1], px[2]);
                if bounds.contains(h, s, v) {
                    *out = 255;
                }
            }
        });
    }
    GrayImage::from_raw(width, height, mask).unwrap_or_else(|| GrayImage::new(width, height))
}

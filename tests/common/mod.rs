//! Synthetic marker photos for the integration tests.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use qrcode::{Color, QrCode};
use std::io::Cursor;

/// Saturated blue tabletop, outside the marker color window
pub const BACKGROUND: Rgb<u8> = Rgb([40, 80, 160]);
/// Slightly warm white paper
pub const PAPER: Rgb<u8> = Rgb([246, 246, 242]);
/// Printer ink
pub const INK: Rgb<u8> = Rgb([25, 25, 30]);

pub const CANVAS: (u32, u32) = (640, 480);

pub fn canvas(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, BACKGROUND)
}

/// Paint a blank paper square with its top-left corner at `(x0, y0)`
pub fn paint_paper(image: &mut RgbImage, x0: u32, y0: u32, side: u32) {
    for y in y0..(y0 + side).min(image.height()) {
        for x in x0..(x0 + side).min(image.width()) {
            image.put_pixel(x, y, PAPER);
        }
    }
}

/// Side of the paper square `paint_marker` draws for `token`
pub fn marker_side(token: &str, module_px: u32, margin_px: u32) -> u32 {
    let code = QrCode::new(token.as_bytes()).unwrap();
    code.width() as u32 * module_px + 2 * margin_px
}

/// Paint paper with the QR symbol for `token` printed in the middle.
///
/// Returns the paper side.
pub fn paint_marker(
    image: &mut RgbImage,
    token: &str,
    x0: u32,
    y0: u32,
    module_px: u32,
    margin_px: u32,
) -> u32 {
    let code = QrCode::new(token.as_bytes()).unwrap();
    let n = code.width() as u32;
    let colors = code.to_colors();
    let side = n * module_px + 2 * margin_px;

    paint_paper(image, x0, y0, side);
    for my in 0..n {
        for mx in 0..n {
            if colors[(my * n + mx) as usize] != Color::Dark {
                continue;
            }
            for dy in 0..module_px {
                for dx in 0..module_px {
                    let x = x0 + margin_px + mx * module_px + dx;
                    let y = y0 + margin_px + my * module_px + dy;
                    image.put_pixel(x, y, INK);
                }
            }
        }
    }
    side
}

/// A marker for `token` centered on a 640x480 tabletop
pub fn marker_scene(token: &str, module_px: u32, margin_px: u32) -> RgbImage {
    let mut image = canvas(CANVAS.0, CANVAS.1);
    let side = marker_side(token, module_px, margin_px);
    let x0 = (CANVAS.0 - side) / 2;
    let y0 = (CANVAS.1 - side) / 2;
    paint_marker(&mut image, token, x0, y0, module_px, margin_px);
    image
}

pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

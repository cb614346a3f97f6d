use image::{Rgb, RgbImage};
use qr_marker::tools::{bench_limit_from_env, dataset_iter, dataset_root_from_env};
use qrcode::{Color, QrCode};
use std::path::PathBuf;

pub fn collect_dataset_images() -> (PathBuf, Vec<PathBuf>) {
    let root = dataset_root_from_env();
    let limit = bench_limit_from_env();

    let images: Vec<PathBuf> = dataset_iter(&root, limit).collect();
    (root, images)
}

/// Printed marker for `token` centered on a `width` x `height` blue tabletop
pub fn synthetic_scene(token: &str, width: u32, height: u32, module_px: u32) -> RgbImage {
    let code = QrCode::new(token.as_bytes()).unwrap();
    let n = code.width() as u32;
    let colors = code.to_colors();
    let margin = 4 * module_px;
    let side = n * module_px + 2 * margin;
    let (x0, y0) = ((width - side) / 2, (height - side) / 2);

    RgbImage::from_fn(width, height, |x, y| {
        if x < x0 || y < y0 || x >= x0 + side || y >= y0 + side {
            return Rgb([40, 80, 160]);
        }
        let (px, py) = (x - x0, y - y0);
        if px < margin || py < margin || px >= margin + n * module_px || py >= margin + n * module_px {
            return Rgb([246, 246, 242]);
        }
        let (mx, my) = ((px - margin) / module_px, (py - margin) / module_px);
        match colors[(my * n + mx) as usize] {
            Color::Dark => Rgb([25, 25, 30]),
            Color::Light => Rgb([246, 246, 242]),
        }
    })
}

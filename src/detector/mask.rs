use crate::config::ScanConfig;
use crate::utils::color::hsv_mask;
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

/// Binary mask of marker-colored pixels, cleaned by closing then opening.
///
/// Closing fills pinholes inside the printed paper; opening removes isolated
/// bright specks. Both use a square structuring element of side `kernel_size`.
pub fn marker_mask(image: &image::RgbImage, config: &ScanConfig) -> GrayImage {
    let raw = hsv_mask(image, &config.mask);
    let radius = config.kernel_radius();
    if radius == 0 {
        return raw;
    }
    let closed = close(&raw, Norm::LInf, radius);
    open(&closed, Norm::LInf, radius)
}

/// Fraction of mask pixels that are set
pub fn coverage(mask: &GrayImage) -> f32 {
    let total = mask.as_raw().len();
    if total == 0 {
        return 0.0;
    }
    let set = mask.as_raw().iter().filter(|&&v| v != 0).count();
    set as f32 / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn scene_with_paper() -> RgbImage {
        let mut img = RgbImage::from_pixel(60, 60, Rgb([30, 70, 140]));
        for y in 10..50 {
            for x in 10..50 {
                img.put_pixel(x, y, Rgb([245, 245, 240]));
            }
        }
        img
    }

    #[test]
    fn test_closing_fills_pinholes() {
        let mut img = scene_with_paper();
        img.put_pixel(30, 30, Rgb([0, 0, 0]));
        img.put_pixel(31, 30, Rgb([0, 0, 0]));

        let mask = marker_mask(&img, &ScanConfig::default());
        assert_eq!(mask.get_pixel(30, 30).0[0], 255);
        assert_eq!(mask.get_pixel(31, 30).0[0], 255);
    }

    #[test]
    fn test_opening_removes_specks() {
        let mut img = scene_with_paper();
        img.put_pixel(3, 3, Rgb([255, 255, 255]));
        img.put_pixel(4, 3, Rgb([255, 255, 255]));

        let mask = marker_mask(&img, &ScanConfig::default());
        assert_eq!(mask.get_pixel(3, 3).0[0], 0);
        assert_eq!(mask.get_pixel(25, 25).0[0], 255);
    }

    #[test]
    fn test_coverage() {
        let img = scene_with_paper();
        let mask = marker_mask(&img, &ScanConfig::default());
        let expected = (40.0 * 40.0) / (60.0 * 60.0);
        assert!((coverage(&mask) - expected).abs() < 0.02);
        assert_eq!(coverage(&GrayImage::new(0, 0)), 0.0);
    }
}

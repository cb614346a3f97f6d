use crate::models::BitMatrix;

/// Convert grayscale image to binary using Otsu's thresholding method
/// Returns a BitMatrix where true = dark (below the threshold)
///
/// A single-intensity image has no between-class split and binarizes to all light.
pub fn otsu_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    let threshold = otsu_threshold(gray).unwrap_or(0);
    threshold_binarize(gray, width, height, threshold)
}

/// Otsu's optimal threshold: pixels `< t` form the dark class.
///
/// `None` when fewer than two intensities are present.
pub fn otsu_threshold(gray: &[u8]) -> Option<u8> {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut best: Option<(f64, u8)> = None;
    let mut dark_count = 0u64;
    let mut dark_sum = 0.0f64;

    // Threshold t puts intensities 0..t in the dark class
    for t in 1..=255usize {
        dark_count += histogram[t - 1];
        dark_sum += (t - 1) as f64 * histogram[t - 1] as f64;

        let light_count = gray.len() as u64 - dark_count;
        if dark_count == 0 || light_count == 0 {
            continue;
        }

        let dark_mean = dark_sum / dark_count as f64;
        let light_mean = (total_sum - dark_sum) / light_count as f64;
        let w_dark = dark_count as f64 / total;
        let w_light = light_count as f64 / total;
        let variance = w_dark * w_light * (dark_mean - light_mean).powi(2);

        if best.is_none_or(|(v, _)| variance > v) {
            best = Some((variance, t as u8));
        }
    }

    best.map(|(_, t)| t)
}

/// Simple global threshold binarization
pub fn threshold_binarize(gray: &[u8], width: usize, height: usize, threshold: u8) -> BitMatrix {
    BitMatrix::from_fn(width, height, |x, y| gray[y * width + x] < threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_binarize() {
        let gray = vec![100, 150, 200, 50]; // 2x2 image
        let binary = threshold_binarize(&gray, 2, 2, 128);

        // Pixels < 128 should be dark (true)
        assert!(binary.get(0, 0)); // 100 < 128
        assert!(!binary.get(1, 0)); // 150 >= 128
        assert!(!binary.get(0, 1)); // 200 >= 128
        assert!(binary.get(1, 1)); // 50 < 128
    }

    #[test]
    fn test_otsu_binarize() {
        // Top half dark, bottom half light
        let mut gray = vec![50u8; 50];
        gray.extend(vec![200u8; 50]);

        let binary = otsu_binarize(&gray, 10, 10);
        assert!(binary.get(0, 0));
        assert!(!binary.get(0, 7));
        assert_eq!(binary.count_dark(), 50);
    }

    #[test]
    fn test_otsu_threshold_separates_modes() {
        let mut gray = vec![30u8; 400];
        gray.extend(vec![35u8; 100]);
        gray.extend(vec![220u8; 300]);
        gray.extend(vec![210u8; 200]);
        let t = otsu_threshold(&gray).unwrap();
        assert!(t > 35 && t <= 210, "threshold {t}");
    }

    #[test]
    fn test_flat_image_is_all_light() {
        let gray = vec![90u8; 64];
        assert_eq!(otsu_threshold(&gray), None);
        let binary = otsu_binarize(&gray, 8, 8);
        assert_eq!(binary.count_dark(), 0);
    }
}

//! Border following over a binary mask (Suzuki and Abe).
//!
//! The mask is copied into a zero-padded `i32` label buffer so the tracer never
//! has to bounds-check neighbors. Traced border pixels are relabelled with the
//! border number, which keeps each border from being picked up twice.

use crate::models::PointI;
use image::GrayImage;

/// 8-neighborhood offsets, counter-clockwise from east (y down)
const NEIGHBORHOOD: [(i32, i32); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// One traced border of the mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    /// Border pixels in tracing order
    pub points: Vec<PointI>,
    /// True for the inner border of a hole
    pub hole: bool,
}

/// Padded label buffer: 0 background, 1 untraced foreground, +/-n traced border n
struct LabelGrid {
    labels: Vec<i32>,
    stride: usize,
    /// Flat offsets for the neighborhood, repeated twice so sweeps can run past 7
    deltas: [isize; 16],
}

impl LabelGrid {
    fn from_mask(mask: &GrayImage) -> Self {
        let (width, height) = (mask.width() as usize, mask.height() as usize);
        let stride = width + 2;
        let mut labels = vec![0i32; stride * (height + 2)];
        for (y, row) in mask.as_raw().chunks_exact(width.max(1)).enumerate().take(height) {
            let base = (y + 1) * stride + 1;
            for (x, &v) in row.iter().enumerate() {
                labels[base + x] = i32::from(v != 0);
            }
        }

        let mut deltas = [0isize; 16];
        for (i, &(dx, dy)) in NEIGHBORHOOD.iter().enumerate() {
            let delta = dx as isize + dy as isize * stride as isize;
            deltas[i] = delta;
            deltas[i + 8] = delta;
        }

        Self {
            labels,
            stride,
            deltas,
        }
    }

    #[inline]
    fn step(&self, pos: usize, dir: usize) -> usize {
        pos.wrapping_add_signed(self.deltas[dir])
    }

    /// Trace one border starting at `pos` and label it with `nbd`
    fn follow(&mut self, pos: usize, nbd: i32, start: PointI, hole: bool) -> Contour {
        let mut points = Vec::new();
        let mut point = start;

        // Find the first foreground neighbor, sweeping clockwise
        let mut dir: usize = if hole { 0 } else { 4 };
        let first_dir = dir;
        let mut first_neighbor;
        loop {
            dir = dir.wrapping_sub(1) & 7;
            first_neighbor = self.step(pos, dir);
            if self.labels[first_neighbor] != 0 || dir == first_dir {
                break;
            }
        }

        if self.labels[first_neighbor] == 0 {
            // Isolated pixel
            self.labels[pos] = -nbd;
            points.push(point);
            return Contour { points, hole };
        }

        let mut current = pos;
        loop {
            let came_from = dir;

            // Sweep counter-clockwise from the previous direction to the next border pixel
            let mut next;
            loop {
                dir = (dir + 1) & 15;
                next = self.step(current, dir);
                if self.labels[next] != 0 {
                    break;
                }
            }
            dir &= 7;

            // The east neighbor was examined and is background: right-hand border pixel
            if (dir.wrapping_sub(1) as u32) < came_from as u32 {
                self.labels[current] = -nbd;
            } else if self.labels[current] == 1 {
                self.labels[current] = nbd;
            }

            points.push(point);
            point.x += NEIGHBORHOOD[dir].0;
            point.y += NEIGHBORHOOD[dir].1;

            if next == pos && current == first_neighbor {
                break;
            }

            current = next;
            dir = (dir + 4) & 7;
        }

        Contour { points, hole }
    }
}

/// Trace every outer border and hole border of a binary mask in raster order.
///
/// Any non-zero pixel is foreground. Pixels outside the image count as background.
pub fn find_contours(mask: &GrayImage) -> Vec<Contour> {
    let (width, height) = (mask.width() as usize, mask.height() as usize);
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut grid = LabelGrid::from_mask(mask);
    let mut contours = Vec::new();
    let mut nbd = 1;

    for y in 0..height {
        let row = (y + 1) * grid.stride + 1;
        for x in 0..width {
            let pos = row + x;
            let label = grid.labels[pos];
            if label == 0 {
                continue;
            }

            let outer = label == 1 && grid.labels[pos - 1] == 0;
            let hole = !outer && label >= 1 && grid.labels[pos + 1] == 0;
            if outer || hole {
                nbd += 1;
                let start = PointI::new(x as i32, y as i32);
                contours.push(grid.follow(pos, nbd, start, hole));
            }
        }
    }

    contours
}

/// Closed arc length of a traced border
pub fn perimeter(points: &[PointI]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            ((b.x - a.x) as f64).hypot((b.y - a.y) as f64)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn mask_from_rows(rows: &[&str]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        GrayImage::from_fn(width, height, |x, y| {
            let on = rows[y as usize].as_bytes()[x as usize] == b'#';
            Luma([if on { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_ring_has_outer_and_hole() {
        let mask = mask_from_rows(&[
            ".....", //
            ".###.",
            ".#.#.",
            ".###.",
            ".....",
        ]);
        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 2);
        assert!(!contours[0].hole);
        assert_eq!(contours[0].points.len(), 8);
        assert_eq!(contours[0].points[0], PointI::new(1, 1));
        assert!(contours[1].hole);
    }

    #[test]
    fn test_isolated_pixel() {
        let mask = mask_from_rows(&["...", ".#.", "..."]);
        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![PointI::new(1, 1)]);
    }

    #[test]
    fn test_solid_block_corners_are_traced() {
        let mut mask = GrayImage::new(40, 30);
        for y in 5..25 {
            for x in 8..30 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 1);
        let points = &contours[0].points;
        // Every border pixel of a 22x20 block, each visited once
        assert_eq!(points.len(), 2 * (22 + 20) - 4);
        for corner in [(8, 5), (29, 5), (29, 24), (8, 24)] {
            assert!(points.contains(&PointI::new(corner.0, corner.1)));
        }
    }

    #[test]
    fn test_foreground_touching_frame() {
        let mask = GrayImage::from_pixel(6, 4, Luma([255]));
        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points.len(), 2 * (6 + 4) - 4);
    }

    #[test]
    fn test_two_blobs_in_raster_order() {
        let mask = mask_from_rows(&[
            "......", //
            ".##...",
            ".##.#.",
            "....#.",
        ]);
        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].points[0], PointI::new(1, 1));
        assert_eq!(contours[1].points[0], PointI::new(4, 2));
    }

    #[test]
    fn test_empty_mask() {
        assert!(find_contours(&GrayImage::new(0, 0)).is_empty());
        assert!(find_contours(&GrayImage::new(5, 5)).is_empty());
    }

    #[test]
    fn test_perimeter() {
        let square = [
            PointI::new(0, 0),
            PointI::new(3, 0),
            PointI::new(3, 3),
            PointI::new(0, 3),
        ];
        assert!((perimeter(&square) - 12.0).abs() < 1e-9);
        assert_eq!(perimeter(&square[..1]), 0.0);
    }
}

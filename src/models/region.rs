use super::{Point, PointI};
use crate::utils::geometry::polygon_area;
use image::RgbImage;

/// Four-vertex polygon approximating a mask contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateRegion {
    /// Vertices in contour order
    pub corners: [PointI; 4],
    /// Shoelace area of the polygon in square pixels
    pub area: f64,
    /// Axis-aligned bounding box width (`max - min + 1`)
    pub bbox_width: u32,
    /// Axis-aligned bounding box height (`max - min + 1`)
    pub bbox_height: u32,
}

impl CandidateRegion {
    /// Build a candidate from an approximated polygon; `None` unless it has exactly four vertices
    pub fn from_polygon(poly: &[PointI]) -> Option<Self> {
        let corners: [PointI; 4] = poly.try_into().ok()?;

        let min_x = corners.iter().map(|p| p.x).min()?;
        let max_x = corners.iter().map(|p| p.x).max()?;
        let min_y = corners.iter().map(|p| p.y).min()?;
        let max_y = corners.iter().map(|p| p.y).max()?;

        Some(Self {
            corners,
            area: polygon_area(&corners),
            bbox_width: (max_x - min_x + 1) as u32,
            bbox_height: (max_y - min_y + 1) as u32,
        })
    }

    /// Bounding box width divided by height
    pub fn aspect_ratio(&self) -> f32 {
        self.bbox_width as f32 / self.bbox_height as f32
    }

    /// True when a vertex lies on the outermost row or column of a `width` x `height` frame
    pub fn touches_frame(&self, width: u32, height: u32) -> bool {
        let (max_x, max_y) = (width as i32 - 1, height as i32 - 1);
        self.corners
            .iter()
            .any(|p| p.x <= 0 || p.y <= 0 || p.x >= max_x || p.y >= max_y)
    }
}

/// Minimum-area bounding rectangle, corners clockwise from the topmost one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    /// Corners in clockwise order (image coordinates, y down)
    pub corners: [Point; 4],
    /// Length of the edge `corners[0] -> corners[1]`
    pub width: f32,
    /// Length of the edge `corners[1] -> corners[2]`
    pub height: f32,
}

/// Upright sub-image cut out of the photo around the chosen marker
#[derive(Debug, Clone)]
pub struct RectifiedRoi {
    /// Resampled pixels
    pub image: RgbImage,
    /// Source-image points that map to the ROI corners (clockwise from top-left)
    pub source_corners: [Point; 4],
    /// The candidate the ROI was cut from
    pub candidate: CandidateRegion,
}

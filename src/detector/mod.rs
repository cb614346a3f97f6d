//! Marker locator
//!
//! Finds the printed marker in a photo and cuts it out as an upright ROI:
//! - HSV mask of marker paper, cleaned with closing then opening
//! - Border following over the mask
//! - Polygon approximation and square-ish quadrilateral filtering
//! - Largest-area selection, minimum-area rectangle, perspective warp

/// Candidate filtering and selection
pub mod candidate;
/// Border following over binary masks
pub mod contour;
/// Marker-color mask and morphological cleanup
pub mod mask;
/// Closed-curve polygon approximation
pub mod polygon;
/// Perspective rectification of the chosen region
pub mod rectify;

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::models::{CandidateRegion, RectifiedRoi};
use image::RgbImage;
use log::debug;

/// Every candidate region that passes the filters, in contour order
pub fn find_candidates(image: &RgbImage, config: &ScanConfig) -> Vec<CandidateRegion> {
    let mask = mask::marker_mask(image, config);
    debug!(
        "mask: {}x{}, coverage {:.3}",
        mask.width(),
        mask.height(),
        mask::coverage(&mask)
    );
    let contours = contour::find_contours(&mask);
    candidate::filter_candidates(&contours, config, image.dimensions())
}

/// Locate the marker and return its rectified ROI.
///
/// Fails with `MarkerNotFound` when no candidate survives filtering, and with
/// `InputInvalid` for an image without pixels.
pub fn locate(image: &RgbImage, config: &ScanConfig) -> Result<RectifiedRoi, ScanError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ScanError::InputInvalid(format!(
            "image has no pixels ({width}x{height})"
        )));
    }

    let candidates = find_candidates(image, config);
    let best = candidate::select_largest(&candidates).ok_or(ScanError::MarkerNotFound)?;
    debug!(
        "chosen candidate: area {:.0}, bbox {}x{}, corners {:?}",
        best.area, best.bbox_width, best.bbox_height, best.corners
    );

    let roi = rectify::rectify(image, &best).ok_or(ScanError::MarkerNotFound)?;
    debug!(
        "roi: {}x{} from {:?}",
        roi.image.width(),
        roi.image.height(),
        roi.source_corners
    );
    Ok(roi)
}

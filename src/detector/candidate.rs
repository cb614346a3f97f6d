use super::contour::{Contour, perimeter};
use super::polygon::approx_poly_dp;
use crate::config::ScanConfig;
use crate::models::CandidateRegion;
use log::debug;

/// Approximate every contour and keep the square-ish quadrilaterals.
///
/// A contour survives when its polygon has exactly four vertices, the bounding
/// box aspect ratio lies inside the configured window (inclusive), the polygon
/// area strictly exceeds `min_area`, and (optionally) no vertex lies on the frame
/// edge. Order follows the contour order.
pub fn filter_candidates(
    contours: &[Contour],
    config: &ScanConfig,
    frame: (u32, u32),
) -> Vec<CandidateRegion> {
    let mut candidates = Vec::new();
    let mut rejected = [0usize; 4];

    for contour in contours {
        let epsilon = config.approx_epsilon_frac * perimeter(&contour.points);
        let poly = approx_poly_dp(&contour.points, epsilon);

        let Some(region) = CandidateRegion::from_polygon(&poly) else {
            rejected[0] += 1;
            continue;
        };
        let aspect = region.aspect_ratio();
        if aspect < config.aspect_min || aspect > config.aspect_max {
            rejected[1] += 1;
            continue;
        }
        if region.area <= config.min_area {
            rejected[2] += 1;
            continue;
        }
        if config.reject_border_contacts && region.touches_frame(frame.0, frame.1) {
            rejected[3] += 1;
            continue;
        }
        candidates.push(region);
    }

    debug!(
        "candidates: {} kept of {} contours (vertices {}, aspect {}, area {}, frame {})",
        candidates.len(),
        contours.len(),
        rejected[0],
        rejected[1],
        rejected[2],
        rejected[3]
    );
    candidates
}

/// Largest candidate by area; the earliest wins a tie
pub fn select_largest(candidates: &[CandidateRegion]) -> Option<CandidateRegion> {
    candidates.iter().fold(None, |best: Option<CandidateRegion>, c| match best {
        Some(b) if b.area >= c.area => Some(b),
        _ => Some(*c),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PointI;

    fn square_contour(x0: i32, y0: i32, w: i32, h: i32) -> Contour {
        let mut points = Vec::new();
        for y in y0..y0 + h {
            points.push(PointI::new(x0, y));
        }
        for x in x0..x0 + w {
            points.push(PointI::new(x, y0 + h));
        }
        for y in (y0 + 1..=y0 + h).rev() {
            points.push(PointI::new(x0 + w, y));
        }
        for x in (x0 + 1..=x0 + w).rev() {
            points.push(PointI::new(x, y0));
        }
        Contour {
            points,
            hole: false,
        }
    }

    #[test]
    fn test_filters() {
        let config = ScanConfig::default();
        let contours = vec![
            square_contour(10, 10, 100, 100), // kept
            square_contour(10, 10, 100, 40),  // too elongated
            square_contour(200, 10, 20, 20),  // too small
            square_contour(0, 150, 100, 100), // touches the left edge
        ];
        let kept = filter_candidates(&contours, &config, (400, 400));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bbox_width, 101);
    }

    #[test]
    fn test_border_contact_can_be_allowed() {
        let config = ScanConfig {
            reject_border_contacts: false,
            ..ScanConfig::default()
        };
        let contours = vec![square_contour(0, 150, 100, 100)];
        assert_eq!(filter_candidates(&contours, &config, (400, 400)).len(), 1);
    }

    #[test]
    fn test_aspect_window_is_inclusive() {
        // bbox 101 x 81 -> 1.2469 rejected; 97 x 81 -> 1.1975 kept
        let config = ScanConfig::default();
        let wide = vec![square_contour(10, 10, 100, 80)];
        assert!(filter_candidates(&wide, &config, (400, 400)).is_empty());
        let ok = vec![square_contour(10, 10, 96, 80)];
        assert_eq!(filter_candidates(&ok, &config, (400, 400)).len(), 1);

        let exact = ScanConfig {
            aspect_min: 1.0,
            aspect_max: 1.0,
            ..ScanConfig::default()
        };
        let square = vec![square_contour(10, 10, 100, 100)];
        assert_eq!(filter_candidates(&square, &exact, (400, 400)).len(), 1);
    }

    #[test]
    fn test_select_largest_prefers_first_on_tie() {
        let a = CandidateRegion::from_polygon(&[
            PointI::new(0, 0),
            PointI::new(0, 50),
            PointI::new(50, 50),
            PointI::new(50, 0),
        ])
        .unwrap();
        let b = CandidateRegion::from_polygon(&[
            PointI::new(100, 0),
            PointI::new(100, 50),
            PointI::new(150, 50),
            PointI::new(150, 0),
        ])
        .unwrap();
        let big = CandidateRegion::from_polygon(&[
            PointI::new(0, 100),
            PointI::new(0, 200),
            PointI::new(100, 200),
            PointI::new(100, 100),
        ])
        .unwrap();

        assert_eq!(select_largest(&[a, b]), Some(a));
        assert_eq!(select_largest(&[b, a]), Some(b));
        assert_eq!(select_largest(&[a, big, b]), Some(big));
        assert_eq!(select_largest(&[]), None);
    }
}

//! Douglas-Peucker simplification of closed borders.

use crate::models::PointI;

#[inline]
fn dist_sq(a: PointI, b: PointI) -> f64 {
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    dx * dx + dy * dy
}

/// Approximate a closed curve by a polygon whose edges stay within `epsilon` of it.
///
/// The curve is first split at a pair of far-apart points (found by jumping to
/// the farthest point three times), then each half is split recursively at its
/// farthest point from the chord. Vertices come out in curve order. A final
/// pass drops vertices that sit on a nearly straight run between their neighbors.
pub fn approx_poly_dp(curve: &[PointI], epsilon: f64) -> Vec<PointI> {
    let n = curve.len();
    if n == 0 {
        return Vec::new();
    }
    let at = |i: usize| curve[i % n];
    let eps_sq = epsilon * epsilon;

    let mut start = 0usize;
    let mut far_offset = 0usize;
    let mut max_dist = 0.0;
    for _ in 0..3 {
        start = (start + far_offset) % n;
        max_dist = 0.0;
        for j in 1..n {
            let d = dist_sq(at(start), at(start + j));
            if d > max_dist {
                max_dist = d;
                far_offset = j;
            }
        }
    }

    if max_dist <= eps_sq {
        return vec![at(start)];
    }

    // Index ranges are unwrapped: `end` may exceed `n`
    let far = start + far_offset;
    let mut stack = vec![(far, start + n), (start, far)];
    let mut poly = Vec::new();

    while let Some((first, last)) = stack.pop() {
        let (a, b) = (at(first), at(last));
        let mut split = None;

        if last > first + 1 {
            let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
            let mut max_cross = 0.0;
            let mut max_index = first;
            for i in first + 1..last {
                let p = at(i);
                let cross = ((p.y - a.y) as f64 * dx - (p.x - a.x) as f64 * dy).abs();
                if cross > max_cross {
                    max_cross = cross;
                    max_index = i;
                }
            }
            if max_cross * max_cross > eps_sq * (dx * dx + dy * dy) {
                split = Some(max_index);
            }
        }

        match split {
            Some(mid) => {
                stack.push((mid, last));
                stack.push((first, mid));
            }
            None => poly.push(a),
        }
    }

    drop_straight_vertices(poly, eps_sq)
}

/// Remove vertices within `epsilon / sqrt(2)` of the chord joining their neighbors
fn drop_straight_vertices(mut poly: Vec<PointI>, eps_sq: f64) -> Vec<PointI> {
    let mut i = 0;
    while poly.len() > 3 && i < poly.len() {
        let n = poly.len();
        let prev = poly[(i + n - 1) % n];
        let cur = poly[i];
        let next = poly[(i + 1) % n];

        let (dx, dy) = ((next.x - prev.x) as f64, (next.y - prev.y) as f64);
        let cross = ((cur.x - prev.x) as f64 * dy - (cur.y - prev.y) as f64 * dx).abs();
        // Non-negative when `cur` projects between its neighbors
        let along = (cur.x - prev.x) as f64 * (next.x - cur.x) as f64
            + (cur.y - prev.y) as f64 * (next.y - cur.y) as f64;

        if cross * cross <= 0.5 * eps_sq * (dx * dx + dy * dy) && along >= 0.0 {
            poly.remove(i);
        } else {
            i += 1;
        }
    }
    poly
}

// src/court.rs
//
// Court calibration geometry: corner canonicalization, point-in-polygon
// filtering, and the pixel-to-court perspective transform.

use crate::error::{AnalysisError, Result};
use crate::types::Point;

/// Area below which a corner triple counts as collinear, squared pixels.
const DEGENERACY_EPS: f64 = 1e-6;

/// Homogeneous w values closer to zero than this make the projection
/// undefined.
const W_EPS: f64 = 1e-9;

/// The playable court quadrilateral in source pixels. Corners are held in
/// canonical order: top-left, top-right, bottom-right, bottom-left.
/// Created once per match from calibration input, read-only afterwards.
#[derive(Debug, Clone)]
pub struct CourtPolygon {
    corners: [Point; 4],
}

impl CourtPolygon {
    /// Build from 4 corners in any order. Fails fast on a wrong count or
    /// a degenerate quadrilateral (three collinear corners), since the
    /// perspective transform would be undefined.
    pub fn from_corners(corners: &[Point]) -> Result<Self> {
        if corners.len() != 4 {
            return Err(AnalysisError::CornerCount(corners.len()));
        }
        let ordered = order_points([corners[0], corners[1], corners[2], corners[3]]);
        for i in 0..4 {
            for j in i + 1..4 {
                for k in j + 1..4 {
                    if collinear(ordered[i], ordered[j], ordered[k]) {
                        return Err(AnalysisError::DegenerateCourt);
                    }
                }
            }
        }
        Ok(Self { corners: ordered })
    }

    /// Corners arrive in the coordinates of the scaled-down preview the
    /// user clicked on; rescale to source pixels before canonicalizing.
    pub fn from_ui_corners(
        corners: &[Point],
        display_size: (f64, f64),
        frame_size: (f64, f64),
    ) -> Result<Self> {
        let fx = frame_size.0 / display_size.0;
        let fy = frame_size.1 / display_size.1;
        let scaled: Vec<Point> = corners
            .iter()
            .map(|c| Point::new(c.x * fx, c.y * fy))
            .collect();
        Self::from_corners(&scaled)
    }

    /// Canonical TL, TR, BR, BL.
    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }

    /// Ray-casting containment test. Points on an edge count as inside,
    /// matching the reference behavior of filtering only strictly-outside
    /// detections.
    pub fn contains(&self, p: Point) -> bool {
        let c = &self.corners;
        let mut inside = false;
        let mut j = 3;
        for i in 0..4 {
            let (a, b) = (c[i], c[j]);
            if on_segment(a, b, p) {
                return true;
            }
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Canonicalize rotational order with the sum/difference heuristic:
/// top-left minimizes x+y, bottom-right maximizes it, top-right minimizes
/// y-x, bottom-left maximizes y-x. Robust to arbitrary input order and
/// moderate perspective skew; assumes the quadrilateral is not rotated
/// more than roughly 45 degrees in the image, which holds for a court
/// camera mounted behind a baseline.
fn order_points(pts: [Point; 4]) -> [Point; 4] {
    let by_key = |key: fn(&Point) -> f64, max: bool| -> Point {
        let mut best = pts[0];
        for p in &pts[1..] {
            let better = if max {
                key(p) > key(&best)
            } else {
                key(p) < key(&best)
            };
            if better {
                best = *p;
            }
        }
        best
    };
    let top_left = by_key(|p| p.x + p.y, false);
    let bottom_right = by_key(|p| p.x + p.y, true);
    let top_right = by_key(|p| p.y - p.x, false);
    let bottom_left = by_key(|p| p.y - p.x, true);
    [top_left, top_right, bottom_right, bottom_left]
}

fn collinear(a: Point, b: Point, c: Point) -> bool {
    let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    cross.abs() < DEGENERACY_EPS
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    if !collinear(a, b, p) {
        return false;
    }
    p.x >= a.x.min(b.x) - 1e-9
        && p.x <= a.x.max(b.x) + 1e-9
        && p.y >= a.y.min(b.y) - 1e-9
        && p.y <= a.y.max(b.y) + 1e-9
}

/// 3x3 projective matrix mapping source pixels to canonical court
/// coordinates: origin at the top-left corner, x along the width, y along
/// the length, in real units. Derived once per match, immutable.
#[derive(Debug, Clone)]
pub struct PerspectiveTransform {
    m: [[f64; 3]; 3],
}

impl PerspectiveTransform {
    /// The canonical destination rectangle, TL, TR, BR, BL.
    pub fn court_outline(width: f64, length: f64) -> [Point; 4] {
        [
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, length),
            Point::new(0.0, length),
        ]
    }

    /// Solve the homography taking the court's pixel corners onto the
    /// width x length rectangle via the 8x8 direct linear system.
    pub fn from_court(court: &CourtPolygon, width: f64, length: f64) -> Result<Self> {
        let src = court.corners();
        let dst = Self::court_outline(width, length);

        // Two rows per correspondence, unknowns h11..h32 with h33 = 1.
        let mut a = [[0.0f64; 9]; 8];
        for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
            a[2 * i] = [s.x, s.y, 1.0, 0.0, 0.0, 0.0, -d.x * s.x, -d.x * s.y, d.x];
            a[2 * i + 1] = [0.0, 0.0, 0.0, s.x, s.y, 1.0, -d.y * s.x, -d.y * s.y, d.y];
        }

        let h = solve_8x8(&mut a).ok_or(AnalysisError::DegenerateCourt)?;
        Ok(Self {
            m: [
                [h[0], h[1], h[2]],
                [h[3], h[4], h[5]],
                [h[6], h[7], 1.0],
            ],
        })
    }

    /// Map a pixel point into court coordinates: homogeneous multiply,
    /// then perspective division. Errors rather than returning garbage
    /// when w is (numerically) zero. Absent positions never reach this
    /// function; `Option` short-circuits at the call sites.
    pub fn project(&self, p: Point) -> Result<Point> {
        let m = &self.m;
        let u = m[0][0] * p.x + m[0][1] * p.y + m[0][2];
        let v = m[1][0] * p.x + m[1][1] * p.y + m[1][2];
        let w = m[2][0] * p.x + m[2][1] * p.y + m[2][2];
        if w.abs() < W_EPS {
            return Err(AnalysisError::ProjectionUndefined { x: p.x, y: p.y });
        }
        Ok(Point::new(u / w, v / w))
    }
}

/// Gaussian elimination with partial pivoting on an 8x9 augmented system.
/// Returns `None` when the system is singular, which for our inputs means
/// the source corners are degenerate.
fn solve_8x8(a: &mut [[f64; 9]; 8]) -> Option<[f64; 8]> {
    for col in 0..8 {
        let pivot = (col..8).max_by(|&r1, &r2| {
            a[r1][col]
                .abs()
                .partial_cmp(&a[r2][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        for row in col + 1..8 {
            let factor = a[row][col] / a[col][col];
            for k in col..9 {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    let mut x = [0.0f64; 8];
    for row in (0..8).rev() {
        let mut sum = a[row][8];
        for k in row + 1..8 {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    Some(x)
}

// src/detect.rs
//
// Interfaces presented by the perception collaborators. The networks
// themselves (person detector, ball position network, bounce regressor)
// live behind these traits; the pipeline treats every call as opaque and
// potentially blocking, and never retries a failed one.

use anyhow::Result;

use crate::court::CourtPolygon;
use crate::types::Point;

/// One raw detection from the person detector.
#[derive(Debug, Clone)]
pub struct Detection {
    /// [x1, y1, x2, y2] in source pixels.
    pub bbox: [f64; 4],
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    /// The pixel used to represent a person's position on the court:
    /// horizontal bbox midpoint at the bottom edge, approximating ground
    /// contact.
    pub fn foot_point(&self) -> Point {
        Point::new((self.bbox[0] + self.bbox[2]) / 2.0, self.bbox[3])
    }

    pub fn is_person(&self) -> bool {
        self.label == "person"
    }
}

/// Person detector collaborator. Operates on batches for throughput; batch
/// boundaries carry no semantic meaning.
pub trait PersonDetector<F> {
    /// One detection list per input frame, same order.
    fn detect_batch(&mut self, frames: &[F]) -> Result<Vec<Vec<Detection>>>;
}

/// Ball position collaborator. Consumes a 3-consecutive-frame temporal
/// window and returns a coordinate in its fixed 640x360 inference
/// resolution, or `None` when the ball is not seen.
pub trait BallDetector<F> {
    fn detect(&mut self, preprev: &F, prev: &F, current: &F) -> Result<Option<Point>>;
}

#[derive(Debug, Clone, Copy)]
pub struct BouncePrediction {
    /// 0-based offset into the x/y sequences.
    pub index: u64,
    pub confidence: f32,
}

/// Bounce collaborator. Consumes the interpolated x/y sequences (gaps as
/// `None`) and returns candidate bounce frames with confidence scores.
pub trait BounceDetector {
    fn predict(
        &mut self,
        xs: &[Option<f64>],
        ys: &[Option<f64>],
    ) -> Result<Vec<BouncePrediction>>;
}

/// Court filtering happens at the collaborator boundary: keep person boxes,
/// reduce to foot-points, drop anything outside the court polygon.
pub fn court_foot_points(detections: &[Detection], court: &CourtPolygon) -> Vec<Point> {
    detections
        .iter()
        .filter(|d| d.is_person())
        .map(|d| d.foot_point())
        .filter(|p| court.contains(*p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f64, y1: f64, x2: f64, y2: f64, label: &str) -> Detection {
        Detection {
            bbox: [x1, y1, x2, y2],
            label: label.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_foot_point_is_bottom_center() {
        let d = det(100.0, 50.0, 200.0, 400.0, "person");
        assert_eq!(d.foot_point(), Point::new(150.0, 400.0));
    }

    #[test]
    fn test_court_filter_drops_non_persons_and_outsiders() {
        let court = CourtPolygon::from_corners(&[
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ])
        .unwrap();
        let detections = vec![
            det(40.0, 10.0, 60.0, 50.0, "person"),
            det(40.0, 10.0, 60.0, 50.0, "sports ball"),
            det(300.0, 10.0, 320.0, 50.0, "person"),
        ];
        let feet = court_foot_points(&detections, &court);
        assert_eq!(feet, vec![Point::new(50.0, 50.0)]);
    }
}

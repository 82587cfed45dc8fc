// src/ball_track.rs
//
// Turns the raw per-frame ball samples into a denoised, gap-interpolated,
// bounce-annotated trajectory. Stages run in order: outlier removal,
// subtrack splitting, per-subtrack linear interpolation, bounce inference.
//
// The outlier rule is asymmetric on purpose: a sample is only discarded
// when the jump it makes is not continued by the next sample, so a real
// fast trajectory survives while a one-frame detector glitch does not.
// The look-behind half of the rule (invalidating the previous sample when
// its incoming distance is undefined) is kept exactly as tuned in the
// reference fixtures.

use tracing::debug;

use crate::config::BallConfig;
use crate::detect::BounceDetector;
use crate::error::Result;
use crate::types::{BallTrackEntry, Point, RawBallSample};

pub struct BallPathAssembler {
    cfg: BallConfig,
}

impl BallPathAssembler {
    pub fn new(cfg: BallConfig) -> Self {
        Self { cfg }
    }

    /// Full pass over one video's samples. Emits exactly one entry per
    /// input sample, preserving absent markers for frames outside any
    /// retained subtrack. An all-absent input yields an all-absent output
    /// with no bounces; that is a data-sparsity condition, not an error.
    pub fn assemble(
        &self,
        samples: &[RawBallSample],
        bounce: &mut dyn BounceDetector,
    ) -> Result<Vec<BallTrackEntry>> {
        let mut track: Vec<Option<Point>> = samples.iter().map(|s| s.pos).collect();

        let dists = neighbor_distances(&track);
        self.remove_outliers(&mut track, &dists);

        let subtracks = self.split_subtracks(&track);
        debug!(
            subtracks = subtracks.len(),
            "ball track split for interpolation"
        );

        // Frames outside every retained subtrack stay absent, including
        // detections stranded in subtracks too short to anchor an
        // interpolation.
        let mut filled: Vec<Option<Point>> = vec![None; track.len()];
        for &(start, end) in &subtracks {
            let mut segment = track[start..end].to_vec();
            interpolate_segment(&mut segment);
            filled[start..end].copy_from_slice(&segment);
        }

        let bounce_frames = if filled.iter().any(|p| p.is_some()) {
            let xs: Vec<Option<f64>> = filled.iter().map(|p| p.map(|q| q.x)).collect();
            let ys: Vec<Option<f64>> = filled.iter().map(|p| p.map(|q| q.y)).collect();
            let predictions = bounce.predict(&xs, &ys)?;
            predictions
                .into_iter()
                .filter(|p| p.confidence >= self.cfg.bounce_confidence)
                .map(|p| p.index)
                .collect()
        } else {
            Vec::new()
        };

        Ok(samples
            .iter()
            .zip(filled)
            .enumerate()
            .map(|(i, (sample, pos))| BallTrackEntry {
                index: sample.index,
                pos,
                bounce: pos.is_some() && bounce_frames.contains(&(i as u64)),
            })
            .collect())
    }

    /// Invalidate isolated single-frame jumps. Operates on the distances
    /// computed before any removal, matching the reference behavior.
    fn remove_outliers(&self, track: &mut [Option<Point>], dists: &[Option<f64>]) {
        let max_dist = self.cfg.max_neighbor_dist;
        for i in 0..dists.len() {
            let over = matches!(dists[i], Some(d) if d > max_dist);
            if !over {
                continue;
            }
            if i + 1 < dists.len() {
                let next_over = match dists[i + 1] {
                    Some(d) => d > max_dist,
                    None => true,
                };
                if next_over {
                    track[i] = None;
                }
            }
            if i > 0 && dists[i - 1].is_none() {
                track[i - 1] = None;
            }
        }
    }

    /// Partition the track into maximal runs reliable enough for
    /// interpolation. A gap splits the track when it is long (>= max_gap
    /// absent frames) or when the displacement across it averages more
    /// than max_dist_per_gap_frame per frame, which signals the ball left
    /// and re-entered view. Candidate subtracks shorter than min_subtrack
    /// are not emitted.
    fn split_subtracks(&self, track: &[Option<Point>]) -> Vec<(usize, usize)> {
        let groups = run_lengths(track);

        let mut result = Vec::new();
        let mut cursor = 0usize;
        let mut subtrack_start = 0usize;

        for (i, &(present, len)) in groups.iter().enumerate() {
            if !present && i > 0 && i + 1 < groups.len() {
                // Anchors on both sides of the gap are present by
                // construction of the run-length groups.
                let split = if len >= self.cfg.max_gap {
                    true
                } else {
                    match (track[cursor - 1], track[cursor + len]) {
                        (Some(a), Some(b)) => {
                            a.distance(&b) / len as f64 > self.cfg.max_dist_per_gap_frame
                        }
                        _ => true,
                    }
                };
                if split {
                    if cursor - subtrack_start > self.cfg.min_subtrack {
                        result.push((subtrack_start, cursor));
                    }
                    subtrack_start = cursor + len - 1;
                }
            }
            cursor += len;
        }

        if track.len() - subtrack_start > self.cfg.min_subtrack {
            result.push((subtrack_start, track.len()));
        }
        result
    }
}

/// Euclidean distances between neighbouring samples. Undefined (rather
/// than sentinel-encoded) when either endpoint is absent; entry 0 is
/// always undefined since there is no previous sample.
pub fn neighbor_distances(track: &[Option<Point>]) -> Vec<Option<f64>> {
    let mut dists = Vec::with_capacity(track.len());
    dists.push(None);
    for pair in track.windows(2) {
        dists.push(match (pair[0], pair[1]) {
            (Some(a), Some(b)) => Some(a.distance(&b)),
            _ => None,
        });
    }
    dists
}

/// Run-length encode presence: (is_present, run length).
fn run_lengths(track: &[Option<Point>]) -> Vec<(bool, usize)> {
    let mut groups: Vec<(bool, usize)> = Vec::new();
    for sample in track {
        let present = sample.is_some();
        match groups.last_mut() {
            Some((p, len)) if *p == present => *len += 1,
            _ => groups.push((present, 1)),
        }
    }
    groups
}

/// Fill internal absent samples by linear interpolation against frame
/// index, independently per axis. Bounded by the segment's first and last
/// present samples; leading and trailing absences are never extrapolated.
fn interpolate_segment(segment: &mut [Option<Point>]) {
    let first = match segment.iter().position(|p| p.is_some()) {
        Some(i) => i,
        None => return,
    };
    let last = segment.iter().rposition(|p| p.is_some()).unwrap();

    let mut anchor = first;
    for i in first + 1..=last {
        if segment[i].is_none() {
            continue;
        }
        if i > anchor + 1 {
            let a = segment[anchor].unwrap();
            let b = segment[i].unwrap();
            let span = (i - anchor) as f64;
            for j in anchor + 1..i {
                let t = (j - anchor) as f64 / span;
                segment[j] = Some(Point::new(
                    a.x + (b.x - a.x) * t,
                    a.y + (b.y - a.y) * t,
                ));
            }
        }
        anchor = i;
    }
}

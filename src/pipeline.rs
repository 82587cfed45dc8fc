// src/pipeline.rs
//
// End-to-end orchestration of one match analysis: chunked frame intake,
// perception collaborator calls, slot tracking, ball path assembly, court
// projection, role normalization. Single pass, bounded memory in the frame
// dimension; per-frame scalar records for the whole clip are kept, frames
// themselves are not.

use tracing::{debug, info};

use crate::ball_track::BallPathAssembler;
use crate::chunker::{FrameChunker, FrameSource, CHUNK_OVERLAP};
use crate::config::Config;
use crate::court::{CourtPolygon, PerspectiveTransform};
use crate::detect::{court_foot_points, BallDetector, BounceDetector, PersonDetector};
use crate::error::{AnalysisError, Result};
use crate::player_tracker::SlotTracker;
use crate::roles::RoleMapping;
use crate::types::{
    BallPoint, MatchResult, Point, RawBallSample, SlotFrameRecord, PLAYER_SLOTS,
};

/// Source video properties, supplied by the decoder.
#[derive(Debug, Clone, Copy)]
pub struct VideoMeta {
    pub fps: f64,
    /// Decoded frame size in pixels.
    pub width: f64,
    pub height: f64,
}

/// Run the full analysis over one video. `corners` are the court corners
/// in source pixels, any order. The collaborators are called exactly once
/// per unit of work; any collaborator failure aborts the run.
pub fn analyze<S, P, B, C>(
    source: S,
    meta: &VideoMeta,
    corners: &[Point],
    cfg: &Config,
    person: &mut P,
    ball: &mut B,
    bounce: &mut C,
) -> Result<MatchResult>
where
    S: FrameSource,
    S::Frame: Clone,
    P: PersonDetector<S::Frame>,
    B: BallDetector<S::Frame>,
    C: BounceDetector,
{
    let court = CourtPolygon::from_corners(corners)?;
    let transform =
        PerspectiveTransform::from_court(&court, cfg.court.width, cfg.court.length)?;
    info!(
        fps = meta.fps,
        width = meta.width,
        height = meta.height,
        "analysis started"
    );

    let mut chunker = FrameChunker::new(source, cfg.chunking.chunk_size);
    let mut tracker = SlotTracker::new(&cfg.tracker);
    let mut ball_samples: Vec<RawBallSample> = Vec::new();
    let mut slot_frames: Vec<(u64, [Option<Point>; PLAYER_SLOTS])> = Vec::new();

    while let Some(chunk) = chunker.next_chunk()? {
        let fresh = chunk.fresh_offset();
        let fresh_frames = &chunk.frames[fresh..];
        debug!(
            start = chunk.start_index,
            frames = fresh_frames.len(),
            "processing chunk"
        );

        let mut detections = Vec::with_capacity(fresh_frames.len());
        for batch in fresh_frames.chunks(cfg.chunking.detection_batch) {
            detections.extend(person.detect_batch(batch)?);
        }
        if detections.len() != fresh_frames.len() {
            return Err(AnalysisError::Input(format!(
                "person detector returned {} result lists for {} frames",
                detections.len(),
                fresh_frames.len()
            )));
        }

        for (i, frame_detections) in detections.iter().enumerate() {
            let local = fresh + i;
            // 1-based frame number for output records.
            let index = chunk.start_index + local as u64 + 1;

            let feet = court_foot_points(frame_detections, &court);
            let snapshot = tracker.step(&feet);
            slot_frames.push((index, snapshot));

            // The ball network wants frames local-2..=local; the first two
            // frames of the video have no full window and stay absent.
            let pos = if local >= CHUNK_OVERLAP {
                ball.detect(
                    &chunk.frames[local - 2],
                    &chunk.frames[local - 1],
                    &chunk.frames[local],
                )?
            } else {
                None
            };
            ball_samples.push(RawBallSample { index, pos });
        }
    }

    let total_frames = slot_frames.len();
    info!(frames = total_frames, "frame pass complete");

    let ball_track = BallPathAssembler::new(cfg.ball.clone()).assemble(&ball_samples, bounce)?;

    // Ball samples live in the network's fixed inference resolution; bring
    // them into source pixels before projecting.
    let scale_x = meta.width / cfg.ball.input_width;
    let scale_y = meta.height / cfg.ball.input_height;

    let mut records = Vec::with_capacity(total_frames);
    for ((index, slots), entry) in slot_frames.iter().zip(&ball_track) {
        let mut projected: [Option<Point>; PLAYER_SLOTS] = [None; PLAYER_SLOTS];
        for (slot, pos) in slots.iter().enumerate() {
            if let Some(p) = pos {
                projected[slot] = Some(transform.project(*p)?);
            }
        }

        let ball = match entry.pos {
            Some(p) => {
                let pixel = Point::new(p.x * scale_x, p.y * scale_y);
                Some(BallPoint {
                    pos: transform.project(pixel)?,
                    bounce: entry.bounce,
                })
            }
            None => None,
        };

        records.push(SlotFrameRecord {
            index: *index,
            slots: projected,
            ball,
        });
    }

    let mapping = RoleMapping::derive(&records)?;
    let frames: Vec<_> = records.iter().map(|r| mapping.apply(r)).collect();

    let ball_coverage = frames.iter().filter(|f| f.ball.is_some()).count();
    info!(
        frames = total_frames,
        ball_frames = ball_coverage,
        calibration_frame = mapping.calibration_frame,
        "analysis complete"
    );

    Ok(MatchResult {
        fps: meta.fps,
        court_outline: PerspectiveTransform::court_outline(cfg.court.width, cfg.court.length),
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BouncePrediction, Detection};
    use crate::roles::PlayerRole;

    struct CountSource {
        remaining: u32,
        next: u32,
    }

    impl FrameSource for CountSource {
        type Frame = u32;

        fn next_frame(&mut self) -> Result<Option<u32>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            let f = self.next;
            self.next += 1;
            Ok(Some(f))
        }
    }

    /// Four stationary players, one per quadrant, plus a spectator outside
    /// the court.
    struct QuadrantPeople;

    impl PersonDetector<u32> for QuadrantPeople {
        fn detect_batch(&mut self, frames: &[u32]) -> anyhow::Result<Vec<Vec<Detection>>> {
            let person = |cx: f64, foot_y: f64| Detection {
                bbox: [cx - 20.0, foot_y - 120.0, cx + 20.0, foot_y],
                label: "person".to_string(),
                confidence: 0.9,
            };
            Ok(frames
                .iter()
                .map(|_| {
                    vec![
                        person(400.0, 200.0),
                        person(900.0, 200.0),
                        person(400.0, 600.0),
                        person(900.0, 600.0),
                        person(2000.0, 600.0),
                    ]
                })
                .collect())
        }
    }

    /// Ball drifting right at 8 px per frame in inference resolution.
    struct DriftingBall;

    impl BallDetector<u32> for DriftingBall {
        fn detect(&mut self, _a: &u32, _b: &u32, current: &u32) -> anyhow::Result<Option<Point>> {
            Ok(Some(Point::new(200.0 + *current as f64 * 8.0, 180.0)))
        }
    }

    struct NoBounce;

    impl BounceDetector for NoBounce {
        fn predict(
            &mut self,
            _xs: &[Option<f64>],
            _ys: &[Option<f64>],
        ) -> anyhow::Result<Vec<BouncePrediction>> {
            Ok(Vec::new())
        }
    }

    fn frame_corners() -> Vec<Point> {
        vec![
            Point::new(100.0, 100.0),
            Point::new(1180.0, 100.0),
            Point::new(1180.0, 700.0),
            Point::new(100.0, 700.0),
        ]
    }

    fn meta() -> VideoMeta {
        VideoMeta {
            fps: 30.0,
            width: 1280.0,
            height: 720.0,
        }
    }

    fn run(frames: u32, cfg: &Config) -> MatchResult {
        analyze(
            CountSource {
                remaining: frames,
                next: 0,
            },
            &meta(),
            &frame_corners(),
            cfg,
            &mut QuadrantPeople,
            &mut DriftingBall,
            &mut NoBounce,
        )
        .unwrap()
    }

    #[test]
    fn test_one_record_per_frame_with_dense_indices() {
        let result = run(20, &Config::default());
        assert_eq!(result.frames.len(), 20);
        for (i, frame) in result.frames.iter().enumerate() {
            assert_eq!(frame.index, i as u64 + 1);
        }
        assert!((result.fps - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_chunking_is_invisible_in_output() {
        let mut small_chunks = Config::default();
        small_chunks.chunking.chunk_size = 7;
        small_chunks.chunking.detection_batch = 3;
        let a = run(40, &Config::default());
        let b = run(40, &small_chunks);

        assert_eq!(a.frames.len(), b.frames.len());
        for (fa, fb) in a.frames.iter().zip(&b.frames) {
            assert_eq!(fa.index, fb.index);
            let ba = fa.ball.map(|x| (x.pos.x, x.pos.y));
            let bb = fb.ball.map(|x| (x.pos.x, x.pos.y));
            assert_eq!(ba, bb);
            for role in [
                PlayerRole::FarLeft,
                PlayerRole::FarRight,
                PlayerRole::NearLeft,
                PlayerRole::NearRight,
            ] {
                assert_eq!(fa.players[&role], fb.players[&role]);
            }
        }
    }

    #[test]
    fn test_players_land_in_their_court_quadrants() {
        let cfg = Config::default();
        let result = run(20, &cfg);
        let frame = &result.frames[5];

        let fl = frame.players[&PlayerRole::FarLeft].unwrap();
        let nr = frame.players[&PlayerRole::NearRight].unwrap();
        assert!(fl.x < cfg.court.width / 2.0 && fl.y < cfg.court.length / 2.0);
        assert!(nr.x > cfg.court.width / 2.0 && nr.y > cfg.court.length / 2.0);
        // The off-court spectator was filtered before tracking.
        assert_eq!(frame.players.len(), PLAYER_SLOTS);
    }

    #[test]
    fn test_first_two_frames_have_no_ball() {
        let result = run(20, &Config::default());
        assert!(result.frames[0].ball.is_none());
        assert!(result.frames[1].ball.is_none());
        assert!(result.frames[5].ball.is_some());
    }

    #[test]
    fn test_ball_moves_monotonically_in_court_x() {
        let result = run(20, &Config::default());
        let xs: Vec<f64> = result
            .frames
            .iter()
            .filter_map(|f| f.ball.map(|b| b.pos.x))
            .collect();
        assert!(xs.len() >= 10);
        for pair in xs.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_court_outline_matches_configured_dimensions() {
        let result = run(20, &Config::default());
        assert_eq!(result.court_outline[0], Point::new(0.0, 0.0));
        assert_eq!(result.court_outline[2], Point::new(10.0, 20.0));
    }
}

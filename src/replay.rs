// src/replay.rs
//
// Recorded-perception input. A perception log is a JSONL file: one header
// line with the video properties, then one line per frame carrying the
// person boxes and the raw ball sample that the live networks produced.
// Replaying a log through the pipeline reproduces a run bit for bit
// without any model runtime, which is how the heuristics are tuned and
// how regressions are bisected.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::chunker::FrameSource;
use crate::detect::{BallDetector, BounceDetector, BouncePrediction, Detection, PersonDetector};
use crate::error::{AnalysisError, Result};
use crate::pipeline::VideoMeta;
use crate::types::Point;

/// One frame of recorded perception. Carries everything the collaborators
/// would have produced for it, so the replay collaborators are stateless
/// pass-throughs.
#[derive(Debug, Clone)]
pub struct ReplayFrame {
    pub detections: Vec<Detection>,
    /// Raw ball sample in the network's 640x360 inference resolution.
    pub ball: Option<Point>,
}

#[derive(Debug, Deserialize)]
struct HeaderLine {
    fps: f64,
    width: f64,
    height: f64,
    #[serde(default)]
    bounces: Vec<BounceLine>,
}

#[derive(Debug, Deserialize)]
struct BounceLine {
    index: u64,
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct FrameLine {
    #[serde(default)]
    boxes: Vec<BoxLine>,
    ball: Option<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct BoxLine {
    bbox: [f64; 4],
    label: String,
    confidence: f32,
}

/// A fully parsed perception log.
#[derive(Debug)]
pub struct PerceptionLog {
    pub meta: VideoMeta,
    pub frames: Vec<ReplayFrame>,
    pub bounces: Vec<BouncePrediction>,
}

impl PerceptionLog {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| AnalysisError::Input(format!("{}: {e}", path.display())))?;
        let log = Self::parse(BufReader::new(file))?;
        info!(
            frames = log.frames.len(),
            fps = log.meta.fps,
            "perception log loaded"
        );
        Ok(log)
    }

    pub fn parse(reader: impl BufRead) -> Result<Self> {
        let mut lines = reader.lines().enumerate();

        let header: HeaderLine = loop {
            match lines.next() {
                Some((n, line)) => {
                    let line = line.map_err(|e| AnalysisError::Input(e.to_string()))?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    break serde_json::from_str(&line).map_err(|e| {
                        AnalysisError::Input(format!("line {}: bad header: {e}", n + 1))
                    })?;
                }
                None => {
                    return Err(AnalysisError::Input(
                        "perception log is empty".to_string(),
                    ))
                }
            }
        };

        let mut frames = Vec::new();
        for (n, line) in lines {
            let line = line.map_err(|e| AnalysisError::Input(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: FrameLine = serde_json::from_str(&line).map_err(|e| {
                AnalysisError::Input(format!("line {}: bad frame record: {e}", n + 1))
            })?;
            frames.push(ReplayFrame {
                detections: parsed
                    .boxes
                    .into_iter()
                    .map(|b| Detection {
                        bbox: b.bbox,
                        label: b.label,
                        confidence: b.confidence,
                    })
                    .collect(),
                ball: parsed.ball.map(|[x, y]| Point::new(x, y)),
            });
        }

        Ok(Self {
            meta: VideoMeta {
                fps: header.fps,
                width: header.width,
                height: header.height,
            },
            frames,
            bounces: header
                .bounces
                .into_iter()
                .map(|b| BouncePrediction {
                    index: b.index,
                    confidence: b.confidence,
                })
                .collect(),
        })
    }

    /// Split into the pieces `pipeline::analyze` wants.
    pub fn into_parts(self) -> (VideoMeta, ReplaySource, RecordedBounces) {
        (
            self.meta,
            ReplaySource {
                frames: self.frames.into_iter(),
            },
            RecordedBounces {
                predictions: self.bounces,
            },
        )
    }
}

pub struct ReplaySource {
    frames: std::vec::IntoIter<ReplayFrame>,
}

impl FrameSource for ReplaySource {
    type Frame = ReplayFrame;

    fn next_frame(&mut self) -> Result<Option<ReplayFrame>> {
        Ok(self.frames.next())
    }
}

/// Replay collaborators: each hands back exactly what the log recorded.
pub struct ReplayPersonDetector;

impl PersonDetector<ReplayFrame> for ReplayPersonDetector {
    fn detect_batch(&mut self, frames: &[ReplayFrame]) -> anyhow::Result<Vec<Vec<Detection>>> {
        Ok(frames.iter().map(|f| f.detections.clone()).collect())
    }
}

pub struct ReplayBallDetector;

impl BallDetector<ReplayFrame> for ReplayBallDetector {
    fn detect(
        &mut self,
        _preprev: &ReplayFrame,
        _prev: &ReplayFrame,
        current: &ReplayFrame,
    ) -> anyhow::Result<Option<Point>> {
        Ok(current.ball)
    }
}

/// Bounce predictions recorded in the log header. Indices are 0-based
/// offsets into the assembled ball sequence.
pub struct RecordedBounces {
    predictions: Vec<BouncePrediction>,
}

impl BounceDetector for RecordedBounces {
    fn predict(
        &mut self,
        _xs: &[Option<f64>],
        _ys: &[Option<f64>],
    ) -> anyhow::Result<Vec<BouncePrediction>> {
        Ok(self.predictions.clone())
    }
}

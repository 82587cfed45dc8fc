// src/config.rs

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub court: CourtConfig,
    pub ball: BallConfig,
    pub tracker: TrackerConfig,
    pub chunking: ChunkingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtConfig {
    /// Real-world court width, in whatever unit the consumer expects.
    pub width: f64,
    /// Real-world court length.
    pub length: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    /// Maximum plausible displacement between neighbouring samples (px).
    pub max_neighbor_dist: f64,
    /// Gap runs of at least this many absent samples split the track.
    pub max_gap: usize,
    /// Maximum average displacement per gap frame before the gap is treated
    /// as the ball leaving and re-entering view.
    pub max_dist_per_gap_frame: f64,
    /// Subtracks shorter than this are dropped rather than interpolated.
    pub min_subtrack: usize,
    /// Confidence threshold passed to the bounce collaborator.
    pub bounce_confidence: f32,
    /// Fixed inference resolution of the ball network.
    pub input_width: f64,
    pub input_height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Gating distance for matching a detection to a slot (px).
    pub gate_px: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Frames per chunk. Peak memory is bounded by this, not video length.
    pub chunk_size: usize,
    /// Frames per person-detection batch.
    pub detection_batch: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            width: 10.0,
            length: 20.0,
        }
    }
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            max_neighbor_dist: 100.0,
            max_gap: 4,
            max_dist_per_gap_frame: 80.0,
            min_subtrack: 5,
            bounce_confidence: 0.0,
            input_width: 640.0,
            input_height: 360.0,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { gate_px: 50.0 }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 256,
            detection_batch: 8,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

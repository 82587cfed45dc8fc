// src/lib.rs
//
// Match trajectory reconstruction for padel video: per-frame player and
// ball positions in real court coordinates, derived from raw perception
// output.

pub mod ball_track;
pub mod chunker;
pub mod config;
pub mod court;
pub mod detect;
pub mod error;
pub mod pipeline;
pub mod player_tracker;
pub mod replay;
pub mod roles;
pub mod types;

pub use config::Config;
pub use error::{AnalysisError, Result};
pub use pipeline::{analyze, VideoMeta};
pub use types::{MatchResult, Point};

// src/types.rs

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::roles::PlayerRole;

/// Number of player identity slots. Fixed for the life of a match.
pub const PLAYER_SLOTS: usize = 4;

/// A 2D point, in pixels or in real court units depending on context.
/// Absence is always `Option<Point>`; the -1 sentinel of the output format
/// exists only in the serialization layer below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("x", &self.x)?;
        map.serialize_entry("y", &self.y)?;
        map.end()
    }
}

/// Court-filtered person foot-points for one frame. Produced at the
/// detection collaborator boundary, consumed by the slot tracker.
#[derive(Debug, Clone)]
pub struct RawDetectionFrame {
    /// 1-based frame number.
    pub index: u64,
    pub foot_points: Vec<Point>,
}

/// One raw ball observation in the 640x360 inference resolution. The first
/// two frames of any contiguous run carry no sample because the ball network
/// needs a 3-frame temporal window.
#[derive(Debug, Clone, Copy)]
pub struct RawBallSample {
    pub index: u64,
    pub pos: Option<Point>,
}

/// One entry of the assembled ball trajectory. Immutable once the assembler
/// completes a full pass. The assembler emits exactly one entry per video
/// frame, in order.
#[derive(Debug, Clone, Copy)]
pub struct BallTrackEntry {
    pub index: u64,
    pub pos: Option<Point>,
    pub bounce: bool,
}

/// Ball position plus bounce flag, after projection to court coordinates.
#[derive(Debug, Clone, Copy)]
pub struct BallPoint {
    pub pos: Point,
    pub bounce: bool,
}

/// Per-frame slot positions before role normalization. Slot array index
/// 0..3 corresponds to slot id 1..4.
#[derive(Debug, Clone)]
pub struct SlotFrameRecord {
    pub index: u64,
    pub slots: [Option<Point>; PLAYER_SLOTS],
    pub ball: Option<BallPoint>,
}

/// Final per-frame record, keyed by semantic court role.
#[derive(Debug, Clone, Serialize)]
pub struct MatchFrameRecord {
    pub index: u64,
    #[serde(serialize_with = "ser_players")]
    pub players: BTreeMap<PlayerRole, Option<Point>>,
    #[serde(serialize_with = "ser_ball")]
    pub ball: Option<BallPoint>,
}

/// The top-level artifact handed to downstream consumers.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub fps: f64,
    /// Canonical court outline in real units: TL, TR, BR, BL.
    pub court_outline: [Point; 4],
    pub frames: Vec<MatchFrameRecord>,
}

// ── Sentinel serialization ──────────────────────────────────────────────
//
// The output format represents absence as (-1, -1), unambiguous because
// court coordinates are non-negative. Internally absence is Option and
// never participates in arithmetic.

fn ser_players<S: Serializer>(
    players: &BTreeMap<PlayerRole, Option<Point>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(players.len()))?;
    for (role, pos) in players {
        match pos {
            Some(p) => map.serialize_entry(role.as_str(), p)?,
            None => map.serialize_entry(role.as_str(), &AbsentPos)?,
        }
    }
    map.end()
}

fn ser_ball<S: Serializer>(ball: &Option<BallPoint>, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(3))?;
    match ball {
        Some(b) => {
            map.serialize_entry("x", &b.pos.x)?;
            map.serialize_entry("y", &b.pos.y)?;
            map.serialize_entry("bounce", &(b.bounce as i32))?;
        }
        None => {
            map.serialize_entry("x", &-1.0)?;
            map.serialize_entry("y", &-1.0)?;
            map.serialize_entry("bounce", &-1)?;
        }
    }
    map.end()
}

struct AbsentPos;

impl Serialize for AbsentPos {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("x", &-1.0)?;
        map.serialize_entry("y", &-1.0)?;
        map.end()
    }
}

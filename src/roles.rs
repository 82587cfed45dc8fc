// src/roles.rs
//
// Role normalization: turn anonymous slot ids into semantic court
// positions. Roles are assigned once, from the first frame where all four
// slots are populated, and never reassigned afterwards even when players
// switch sides. Downstream analytics rely on stable identities, not on
// instantaneous positions.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::error::{AnalysisError, Result};
use crate::types::{MatchFrameRecord, SlotFrameRecord, PLAYER_SLOTS};

/// Semantic court position at calibration time. "Far" is the camera-distant
/// half (smaller image y), "near" the camera-close half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    FarLeft,
    FarRight,
    NearLeft,
    NearRight,
}

impl PlayerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerRole::FarLeft => "far_left",
            PlayerRole::FarRight => "far_right",
            PlayerRole::NearLeft => "near_left",
            PlayerRole::NearRight => "near_right",
        }
    }
}

/// Frozen slot-to-role assignment for one match.
#[derive(Debug, Clone)]
pub struct RoleMapping {
    roles: [PlayerRole; PLAYER_SLOTS],
    /// 1-based frame the mapping was derived from.
    pub calibration_frame: u64,
}

impl RoleMapping {
    /// Derive the mapping from the first frame where every slot holds a
    /// position. The two smallest-y players form the far pair, the other
    /// two the near pair; within each pair the smaller x is the left
    /// player. Fails if no such frame exists in the whole clip.
    pub fn derive(frames: &[SlotFrameRecord]) -> Result<Self> {
        let calibration = frames
            .iter()
            .find(|f| f.slots.iter().all(|s| s.is_some()))
            .ok_or(AnalysisError::NoCalibrationFrame)?;

        // (slot, position) pairs, every position known at this point.
        let mut indexed: Vec<(usize, crate::types::Point)> = calibration
            .slots
            .iter()
            .enumerate()
            .map(|(slot, pos)| (slot, pos.unwrap()))
            .collect();

        indexed.sort_by(|a, b| a.1.y.total_cmp(&b.1.y));
        let (far, near) = indexed.split_at_mut(2);
        far.sort_by(|a, b| a.1.x.total_cmp(&b.1.x));
        near.sort_by(|a, b| a.1.x.total_cmp(&b.1.x));

        let mut roles = [PlayerRole::FarLeft; PLAYER_SLOTS];
        roles[far[0].0] = PlayerRole::FarLeft;
        roles[far[1].0] = PlayerRole::FarRight;
        roles[near[0].0] = PlayerRole::NearLeft;
        roles[near[1].0] = PlayerRole::NearRight;

        info!(
            frame = calibration.index,
            "court roles assigned from calibration frame"
        );

        Ok(Self {
            roles,
            calibration_frame: calibration.index,
        })
    }

    pub fn role_of(&self, slot: usize) -> PlayerRole {
        self.roles[slot]
    }

    /// Relabel one slot record with the frozen roles.
    pub fn apply(&self, record: &SlotFrameRecord) -> MatchFrameRecord {
        let mut players = BTreeMap::new();
        for (slot, pos) in record.slots.iter().enumerate() {
            players.insert(self.roles[slot], *pos);
        }
        MatchFrameRecord {
            index: record.index,
            players,
            ball: record.ball,
        }
    }
}

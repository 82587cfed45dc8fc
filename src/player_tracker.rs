// src/player_tracker.rs
//
// Identity-stable tracking of up to four players. Greedy nearest-neighbor
// assignment of court-filtered foot-points to four persistent slots,
// O(slots x detections) per frame.
//
// This is a deliberate heuristic, not an optimal bipartite matching: ties
// and near-ties break by slot iteration order (1 through 4), and that order
// must be preserved exactly for reproducible output. Slot state is threaded
// sequentially through the frame stream; assignment for frame i+1 never
// runs before frame i has committed.

use tracing::trace;

use crate::config::TrackerConfig;
use crate::types::{Point, PLAYER_SLOTS};

pub struct SlotTracker {
    /// Last known position per slot, or unknown. Slots persist for the
    /// whole clip; one that loses its target keeps the stale position
    /// rather than being cleared.
    slots: [Option<Point>; PLAYER_SLOTS],
    gate_px: f64,
}

impl SlotTracker {
    pub fn new(cfg: &TrackerConfig) -> Self {
        Self {
            slots: [None; PLAYER_SLOTS],
            gate_px: cfg.gate_px,
        }
    }

    /// Commit one frame of detections and return the post-frame slot
    /// snapshot. Detections are already court-filtered foot-points.
    ///
    /// Pass 1: each slot with a known position claims its nearest
    /// unassigned detection, if within the gate. Pass 2: leftover
    /// detections fill the first slot still lacking a position, modelling
    /// players entering the court or a lost slot recovering. Detections
    /// left over after both passes are dropped.
    pub fn step(&mut self, detections: &[Point]) -> [Option<Point>; PLAYER_SLOTS] {
        let mut assigned = vec![false; detections.len()];
        let mut next: [Option<Point>; PLAYER_SLOTS] = [None; PLAYER_SLOTS];

        for slot in 0..PLAYER_SLOTS {
            let last = match self.slots[slot] {
                Some(p) => p,
                None => continue,
            };
            let mut best: Option<(usize, f64)> = None;
            for (j, det) in detections.iter().enumerate() {
                if assigned[j] {
                    continue;
                }
                let d = last.distance(det);
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((j, d));
                }
            }
            match best {
                Some((j, d)) if d < self.gate_px => {
                    next[slot] = Some(detections[j]);
                    assigned[j] = true;
                }
                _ => {
                    // No detection within the gate this frame; hold the
                    // stale position.
                    next[slot] = Some(last);
                }
            }
        }

        for (j, det) in detections.iter().enumerate() {
            if assigned[j] {
                continue;
            }
            for slot in 0..PLAYER_SLOTS {
                if next[slot].is_none() {
                    next[slot] = Some(*det);
                    assigned[j] = true;
                    trace!(slot = slot + 1, "new player entered slot");
                    break;
                }
            }
        }

        self.slots = next;
        next
    }

    pub fn slots(&self) -> &[Option<Point>; PLAYER_SLOTS] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> SlotTracker {
        SlotTracker::new(&TrackerConfig::default())
    }

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_detections_fill_slots_in_order() {
        let mut t = tracker();
        let snapshot = t.step(&[p(100.0, 100.0), p(500.0, 100.0)]);
        assert_eq!(snapshot[0], Some(p(100.0, 100.0)));
        assert_eq!(snapshot[1], Some(p(500.0, 100.0)));
        assert_eq!(snapshot[2], None);
        assert_eq!(snapshot[3], None);
    }

    #[test]
    fn test_nearby_detection_follows_slot() {
        let mut t = tracker();
        t.step(&[p(100.0, 100.0)]);
        let snapshot = t.step(&[p(110.0, 105.0)]);
        assert_eq!(snapshot[0], Some(p(110.0, 105.0)));
        assert_eq!(snapshot[1], None);
    }

    #[test]
    fn test_gate_keeps_stale_position() {
        let mut t = tracker();
        t.step(&[p(100.0, 100.0)]);
        // 200 px away, over the 50 px gate: slot 1 holds its stale
        // position, the far detection lands in the next free slot.
        let snapshot = t.step(&[p(300.0, 100.0)]);
        assert_eq!(snapshot[0], Some(p(100.0, 100.0)));
        assert_eq!(snapshot[1], Some(p(300.0, 100.0)));
    }

    #[test]
    fn test_empty_frame_holds_all_positions() {
        let mut t = tracker();
        t.step(&[p(100.0, 100.0), p(500.0, 100.0)]);
        let snapshot = t.step(&[]);
        assert_eq!(snapshot[0], Some(p(100.0, 100.0)));
        assert_eq!(snapshot[1], Some(p(500.0, 100.0)));
        assert_eq!(snapshot[2], None);
    }

    #[test]
    fn test_excess_detections_silently_dropped() {
        let mut t = tracker();
        let detections: Vec<Point> = (0..6).map(|i| p(i as f64 * 200.0, 50.0)).collect();
        let snapshot = t.step(&detections);
        assert!(snapshot.iter().all(|s| s.is_some()));
        // Fifth and sixth detections have nowhere to go.
        assert_eq!(snapshot[3], Some(p(600.0, 50.0)));
    }

    #[test]
    fn test_assignment_is_deterministic() {
        // Two runs over the same detection stream, including an exact tie
        // (both slots equidistant from one detection), must agree.
        let frames: Vec<Vec<Point>> = vec![
            vec![p(100.0, 100.0), p(200.0, 100.0)],
            vec![p(150.0, 100.0)],
            vec![p(150.0, 100.0), p(210.0, 100.0)],
            vec![],
            vec![p(95.0, 100.0), p(205.0, 100.0)],
        ];
        let run = |mut t: SlotTracker| -> Vec<[Option<Point>; PLAYER_SLOTS]> {
            frames.iter().map(|f| t.step(f)).collect()
        };
        assert_eq!(run(tracker()), run(tracker()));
    }

    #[test]
    fn test_tie_breaks_by_slot_order() {
        let mut t = tracker();
        t.step(&[p(100.0, 100.0), p(140.0, 100.0)]);
        // One detection exactly between the two slots and within both
        // gates: slot 1 is iterated first and claims it; slot 2 keeps its
        // stale position.
        let snapshot = t.step(&[p(120.0, 100.0)]);
        assert_eq!(snapshot[0], Some(p(120.0, 100.0)));
        assert_eq!(snapshot[1], Some(p(140.0, 100.0)));
    }

    #[test]
    fn test_slots_never_destroyed_mid_run() {
        let mut t = tracker();
        t.step(&[p(100.0, 100.0), p(500.0, 100.0), p(100.0, 500.0), p(500.0, 500.0)]);
        for _ in 0..50 {
            t.step(&[]);
        }
        assert!(t.slots().iter().all(|s| s.is_some()));
    }
}

//! Lane selection and overflow handling.
//!
//! Playable lanes are a contiguous group of two-digit channels (classically
//! 11-17). When a note's cell is already taken in its lane, the overflow
//! policy decides between discarding the note and rerouting it to the
//! background channel.

use serde::{Deserialize, Serialize};

use crate::config::{LanePolicy, OverflowPolicy};
use crate::grid::GridCoordinate;

/// A chart channel, rendered as two decimal digits in data rows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Lane(u8);

/// The background (non-playable) channel.
pub const BGM_LANE: Lane = Lane(1);

impl Lane {
    pub fn new(channel: u8) -> Self {
        Self(channel)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn render(self) -> String {
        format!("{:02}", self.0)
    }
}

/// Outcome of lane selection for one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The note goes into a playable lane.
    Placed(Lane),
    /// The note was rerouted to the background channel.
    Rerouted(Lane),
    /// No lane could take the note.
    Dropped,
}

/// Chooses lanes for notes per the configured policies.
#[derive(Debug, Clone, Copy)]
pub struct LaneAssigner {
    policy: LanePolicy,
    overflow: OverflowPolicy,
    base_lane: u8,
    lane_count: u8,
}

impl LaneAssigner {
    pub fn new(policy: LanePolicy, overflow: OverflowPolicy, base_lane: u8, lane_count: u8) -> Self {
        Self {
            policy,
            overflow,
            base_lane,
            lane_count,
        }
    }

    /// All playable lanes of the group, in channel order.
    pub fn lanes(&self) -> impl Iterator<Item = Lane> + '_ {
        (self.base_lane..self.base_lane + self.lane_count).map(Lane::new)
    }

    /// Picks a lane for a note whose onset lands on `onset`.
    ///
    /// `occupied` reports whether a cell is already taken in a lane; the
    /// caller supplies it over whatever rows the current run has built.
    pub fn choose(
        &self,
        pitch: u8,
        onset: GridCoordinate,
        occupied: impl Fn(Lane, GridCoordinate) -> bool,
    ) -> Placement {
        let preferred = Lane::new(self.base_lane + pitch % self.lane_count);
        match self.policy {
            LanePolicy::PitchModulo => {
                if !occupied(preferred, onset) {
                    return Placement::Placed(preferred);
                }
            }
            LanePolicy::FirstFree => {
                for lane in self.lanes() {
                    if !occupied(lane, onset) {
                        return Placement::Placed(lane);
                    }
                }
            }
        }
        match self.overflow {
            OverflowPolicy::Drop => Placement::Dropped,
            OverflowPolicy::BgmLane => {
                if occupied(BGM_LANE, onset) {
                    Placement::Dropped
                } else {
                    Placement::Rerouted(BGM_LANE)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell() -> GridCoordinate {
        GridCoordinate::new(0, 4)
    }

    #[test]
    fn test_lane_renders_two_digits() {
        assert_eq!(Lane::new(11).render(), "11");
        assert_eq!(BGM_LANE.render(), "01");
    }

    #[test]
    fn test_pitch_modulo() {
        let assigner = LaneAssigner::new(
            LanePolicy::PitchModulo,
            OverflowPolicy::Drop,
            11,
            7,
        );
        assert_eq!(
            assigner.choose(60, cell(), |_, _| false),
            Placement::Placed(Lane::new(11 + 60 % 7))
        );
        assert_eq!(
            assigner.choose(61, cell(), |_, _| false),
            Placement::Placed(Lane::new(11 + 61 % 7))
        );
    }

    #[test]
    fn test_modulo_collision_drops() {
        let assigner = LaneAssigner::new(
            LanePolicy::PitchModulo,
            OverflowPolicy::Drop,
            11,
            7,
        );
        assert_eq!(assigner.choose(60, cell(), |_, _| true), Placement::Dropped);
    }

    #[test]
    fn test_first_free_skips_occupied() {
        let assigner = LaneAssigner::new(
            LanePolicy::FirstFree,
            OverflowPolicy::Drop,
            11,
            7,
        );
        let taken = [Lane::new(11), Lane::new(12)];
        let placement = assigner.choose(60, cell(), |lane, _| taken.contains(&lane));
        assert_eq!(placement, Placement::Placed(Lane::new(13)));
    }

    #[test]
    fn test_first_free_full_group_reroutes_to_bgm() {
        let assigner = LaneAssigner::new(
            LanePolicy::FirstFree,
            OverflowPolicy::BgmLane,
            11,
            2,
        );
        let placement = assigner.choose(60, cell(), |lane, _| lane != BGM_LANE);
        assert_eq!(placement, Placement::Rerouted(BGM_LANE));
    }

    #[test]
    fn test_bgm_also_full_drops() {
        let assigner = LaneAssigner::new(
            LanePolicy::FirstFree,
            OverflowPolicy::BgmLane,
            11,
            2,
        );
        assert_eq!(assigner.choose(60, cell(), |_, _| true), Placement::Dropped);
    }

    #[test]
    fn test_single_lane_group() {
        // One pinned lane: every pitch maps to it.
        let assigner = LaneAssigner::new(
            LanePolicy::PitchModulo,
            OverflowPolicy::Drop,
            11,
            1,
        );
        for pitch in [0u8, 37, 254] {
            assert_eq!(
                assigner.choose(pitch, cell(), |_, _| false),
                Placement::Placed(Lane::new(11))
            );
        }
    }
}

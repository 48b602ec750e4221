//! Aggregated per-run anomaly counters.

use serde::{Deserialize, Serialize};

/// Counters accumulated over one conversion run.
///
/// Nothing here is fatal; the pipeline keeps going and the caller decides
/// what the numbers mean for its inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Off-events with no open note to close.
    pub unmatched_off_events: u64,
    /// Notes still open at end-of-stream, closed by policy.
    pub unresolved_intervals: u64,
    /// Clips exported through the audio sink this run.
    pub clips_exported: u64,
    /// Notes that reused an already-registered sample.
    pub samples_reused: u64,
    /// Notes written onto the grid.
    pub notes_placed: u64,
    /// Notes discarded by the overflow policy.
    pub notes_dropped: u64,
    /// Notes rerouted to the background channel.
    pub notes_rerouted: u64,
}

impl RunReport {
    /// Folds another run's counters into this one.
    pub fn merge(&mut self, other: &RunReport) {
        self.unmatched_off_events += other.unmatched_off_events;
        self.unresolved_intervals += other.unresolved_intervals;
        self.clips_exported += other.clips_exported;
        self.samples_reused += other.samples_reused;
        self.notes_placed += other.notes_placed;
        self.notes_dropped += other.notes_dropped;
        self.notes_rerouted += other.notes_rerouted;
    }

    /// True when the run saw no anomalies at all.
    pub fn is_clean(&self) -> bool {
        self.unmatched_off_events == 0
            && self.unresolved_intervals == 0
            && self.notes_dropped == 0
            && self.notes_rerouted == 0
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "placed {} notes ({} clips exported, {} reused); \
             dropped {}, rerouted {}, unmatched offs {}, unresolved {}",
            self.notes_placed,
            self.clips_exported,
            self.samples_reused,
            self.notes_dropped,
            self.notes_rerouted,
            self.unmatched_off_events,
            self.unresolved_intervals
        )
    }
}

//! Tick-to-seconds conversion across tempo changes.
//!
//! Timed note events carry positions in ticks; grid quantization needs wall
//! clock seconds. A [`TempoMap`] integrates piecewise-constant tempo segments
//! so a tick anywhere in the stream converts in one call.

use serde::{Deserialize, Serialize};

/// Default tempo when a stream declares none: 500 000 µs/beat (120 BPM).
pub const DEFAULT_TEMPO: u32 = 500_000;

/// A tempo change taking effect at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoChange {
    pub at_tick: u64,
    pub microseconds_per_beat: u32,
}

/// Piecewise-constant tempo over a tick timeline.
///
/// Changes are normalized on construction: sorted by tick, with the latest
/// value winning when several land on the same tick, and an implicit
/// [`DEFAULT_TEMPO`] entry at tick 0 when none is given.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    ticks_per_beat: u32,
    changes: Vec<TempoChange>,
}

impl TempoMap {
    /// Builds a map from raw tempo changes.
    ///
    /// # Arguments
    /// * `ticks_per_beat` - stream time division; must be non-zero
    /// * `changes` - tempo changes in any order, duplicates allowed
    pub fn new(ticks_per_beat: u32, changes: Vec<TempoChange>) -> Self {
        let mut sorted = changes;
        sorted.sort_by_key(|c| c.at_tick);
        let mut normalized: Vec<TempoChange> = Vec::with_capacity(sorted.len() + 1);
        for change in sorted {
            match normalized.last_mut() {
                // Same tick: the later declaration wins.
                Some(last) if last.at_tick == change.at_tick => *last = change,
                _ => normalized.push(change),
            }
        }
        if normalized.first().map(|c| c.at_tick) != Some(0) {
            normalized.insert(
                0,
                TempoChange {
                    at_tick: 0,
                    microseconds_per_beat: DEFAULT_TEMPO,
                },
            );
        }
        Self {
            ticks_per_beat: ticks_per_beat.max(1),
            changes: normalized,
        }
    }

    /// Converts an absolute tick to seconds from stream start.
    ///
    /// Integrates every full segment before `tick` and pro-rates the segment
    /// containing it. Monotonic in `tick`.
    pub fn time_at(&self, tick: u64) -> f64 {
        let tpb = f64::from(self.ticks_per_beat);
        let mut seconds = 0.0;
        for (i, change) in self.changes.iter().enumerate() {
            let segment_end = self
                .changes
                .get(i + 1)
                .map(|next| next.at_tick)
                .unwrap_or(u64::MAX);
            let end = tick.min(segment_end);
            if end <= change.at_tick {
                break;
            }
            let ticks = (end - change.at_tick) as f64;
            seconds += ticks * f64::from(change.microseconds_per_beat) / tpb / 1_000_000.0;
            if tick <= segment_end {
                break;
            }
        }
        seconds
    }

    /// Effective BPM at an absolute tick.
    pub fn bpm_at(&self, tick: u64) -> f64 {
        let tempo = self
            .changes
            .iter()
            .rev()
            .find(|c| c.at_tick <= tick)
            .map(|c| c.microseconds_per_beat)
            .unwrap_or(DEFAULT_TEMPO);
        60_000_000.0 / f64::from(tempo)
    }

    /// BPM of the last tempo segment.
    pub fn final_bpm(&self) -> f64 {
        self.bpm_at(u64::MAX)
    }

    /// BPM of the first tempo segment.
    pub fn initial_bpm(&self) -> f64 {
        self.bpm_at(0)
    }

    pub fn ticks_per_beat(&self) -> u32 {
        self.ticks_per_beat
    }
}

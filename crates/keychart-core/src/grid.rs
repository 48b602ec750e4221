//! Measure/subdivision quantization.
//!
//! The chart grid divides time into 4/4 measures of `resolution` equal cells.
//! Quantization floors: a note lands in the cell containing its onset, and a
//! time exactly on a measure boundary is subdivision 0 of the new measure.

use serde::{Deserialize, Serialize};

use crate::config::LongNotePolicy;

/// Beats per measure; the document format is 4/4 only.
pub const BEATS_PER_MEASURE: u32 = 4;

/// A cell position on the chart grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GridCoordinate {
    pub measure: u32,
    /// Cell within the measure, `0..resolution`.
    pub subdivision: u32,
}

impl GridCoordinate {
    pub fn new(measure: u32, subdivision: u32) -> Self {
        Self {
            measure,
            subdivision,
        }
    }
}

/// Maps wall-clock seconds onto grid cells at a fixed tempo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    measure_seconds: f64,
    resolution: u32,
}

impl Quantizer {
    /// # Arguments
    /// * `bpm` - chart tempo; the grid assumes it is constant
    /// * `resolution` - cells per measure
    pub fn new(bpm: f64, resolution: u32) -> Self {
        Self {
            measure_seconds: 60.0 / bpm * f64::from(BEATS_PER_MEASURE),
            resolution,
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Quantizes a time to its containing cell.
    ///
    /// Subdivision is clamped to `resolution - 1`; float residue near a
    /// measure boundary never wraps into the next measure's cell 0.
    pub fn coordinate(&self, seconds: f64) -> GridCoordinate {
        let seconds = seconds.max(0.0);
        let measure = (seconds / self.measure_seconds).floor() as u32;
        let within = seconds - f64::from(measure) * self.measure_seconds;
        let subdivision =
            ((within / self.measure_seconds) * f64::from(self.resolution)).floor() as u32;
        GridCoordinate {
            measure,
            subdivision: subdivision.min(self.resolution - 1),
        }
    }

    /// Expands a note interval into the cells it occupies.
    ///
    /// Short notes (under `threshold_ms`) take a single cell. Long notes
    /// follow `policy`: endpoint marking touches the onset and release cells,
    /// span filling touches every cell in between as well, resuming at
    /// subdivision 0 of each intermediate measure.
    pub fn span_cells(
        &self,
        start: f64,
        end: f64,
        policy: LongNotePolicy,
        threshold_ms: u32,
    ) -> Vec<GridCoordinate> {
        let onset = self.coordinate(start);
        let duration_ms = (end - start).max(0.0) * 1000.0;
        if duration_ms < f64::from(threshold_ms) {
            return vec![onset];
        }
        let release = self.coordinate(end);
        if release <= onset {
            return vec![onset];
        }
        match policy {
            LongNotePolicy::MarkEndpoints => vec![onset, release],
            LongNotePolicy::FillSpan => {
                let mut cells = Vec::new();
                let mut cursor = onset;
                loop {
                    cells.push(cursor);
                    if cursor == release {
                        break;
                    }
                    cursor = if cursor.subdivision + 1 < self.resolution {
                        GridCoordinate::new(cursor.measure, cursor.subdivision + 1)
                    } else {
                        GridCoordinate::new(cursor.measure + 1, 0)
                    };
                }
                cells
            }
        }
    }
}

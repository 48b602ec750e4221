//! In-memory chart document and merge semantics.
//!
//! A [`Chart`] is the assembled document: header metadata, the sample table,
//! and the cell grid keyed by `(measure, lane)`. Ordered maps keep rendering
//! deterministic. A conversion run builds its rows separately and splices
//! them in with [`Chart::replace_rows`], so recomputing the same input is
//! idempotent: each row is replaced, never concatenated.

use std::collections::BTreeMap;

use crate::config::{HeaderFields, IdBase};
use crate::lane::Lane;
use crate::sample::SampleId;

/// Address of one data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub measure: u32,
    pub lane: Lane,
}

/// One measure-lane row of cells; `None` renders as the empty placeholder.
pub type Row = Vec<Option<SampleId>>;

/// The assembled chart document.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub header: HeaderFields,
    pub resolution: u32,
    pub id_base: IdBase,
    pub samples: BTreeMap<SampleId, String>,
    pub grid: BTreeMap<RowKey, Row>,
}

impl Chart {
    /// A fresh chart with no samples or rows.
    pub fn new(header: HeaderFields, resolution: u32, id_base: IdBase) -> Self {
        Self {
            header,
            resolution,
            id_base,
            samples: BTreeMap::new(),
            grid: BTreeMap::new(),
        }
    }

    /// Registers a sample path under an identifier.
    pub fn register_sample(&mut self, id: SampleId, path: String) {
        self.samples.insert(id, path);
    }

    /// Highest registered identifier, or 0 when the table is empty.
    ///
    /// Extend-mode runs issue new identifiers starting one past this.
    pub fn max_sample_id(&self) -> u16 {
        self.samples
            .keys()
            .next_back()
            .map(|id| id.value())
            .unwrap_or(0)
    }

    /// Reads one cell; `None` when the row is absent or the cell is empty.
    pub fn cell(&self, measure: u32, lane: Lane, subdivision: u32) -> Option<SampleId> {
        self.grid
            .get(&RowKey { measure, lane })
            .and_then(|row| row.get(subdivision as usize).copied().flatten())
    }

    /// Writes one cell, materializing the row on first touch.
    pub fn set_cell(&mut self, measure: u32, lane: Lane, subdivision: u32, id: SampleId) {
        let resolution = self.resolution as usize;
        let row = self
            .grid
            .entry(RowKey { measure, lane })
            .or_insert_with(|| vec![None; resolution]);
        if let Some(cell) = row.get_mut(subdivision as usize) {
            *cell = Some(id);
        }
    }

    /// Splices a run's rows into the grid, replacing rows wholesale.
    pub fn replace_rows(&mut self, rows: BTreeMap<RowKey, Row>) {
        for (key, row) in rows {
            self.grid.insert(key, row);
        }
    }

    /// Number of measures the chart spans (highest row measure + 1).
    pub fn measure_count(&self) -> u32 {
        self.grid
            .keys()
            .next_back()
            .map(|key| key.measure + 1)
            .unwrap_or(0)
    }

    /// Total non-empty cells across all rows.
    pub fn note_count(&self) -> usize {
        self.grid
            .values()
            .map(|row| row.iter().filter(|c| c.is_some()).count())
            .sum()
    }
}

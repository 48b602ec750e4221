//! keychart Core - Quantized Key-Sound Chart Generation
//!
//! This crate converts streams of timed note events into quantized rhythm-game
//! charts in the classic three-section key-sound text format: a header block,
//! a sample table mapping two-digit identifiers to audio clips, and per-measure
//! data rows of fixed-resolution cells.
//!
//! # Pipeline
//!
//! A conversion run is a pure function of its inputs:
//!
//! 1. Tick-stamped on/off events are paired into note intervals (FIFO per
//!    track and pitch).
//! 2. Intervals are deduplicated into a bounded sample-identifier space and
//!    new clips are exported through the [`sample::AudioSink`] seam.
//! 3. Onsets are quantized onto a measure/subdivision grid.
//! 4. Lanes are chosen per policy and cells are merged into a [`chart::Chart`],
//!    either fresh or extending a previously persisted document.
//!
//! Per-event anomalies (unmatched offs, dropped notes) never abort a run; they
//! accumulate in a [`report::RunReport`]. Identifier-space exhaustion and I/O
//! failures are fatal.
//!
//! # Example
//!
//! ```ignore
//! use keychart_core::{convert, ChartConfig, MemorySink, TempoMap};
//!
//! let config = ChartConfig::default();
//! let tempo = TempoMap::new(480, vec![]);
//! let mut sink = MemorySink::new();
//! let outcome = convert(&events, &tempo, &config, &mut sink, None)?;
//! std::fs::write("song.bms", outcome.chart.render())?;
//! println!("chart hash: {}", outcome.hash);
//! ```
//!
//! # Module Structure
//!
//! - [`tempo`]: tick-to-seconds conversion across tempo changes
//! - [`event`]: raw events and note-interval reconstruction
//! - [`sample`]: sample deduplication and identifier assignment
//! - [`grid`]: measure/subdivision quantization
//! - [`lane`]: lane selection and overflow handling
//! - [`chart`]: in-memory chart document and merge
//! - [`bms`]: text rendering, parsing, and atomic persistence
//! - [`pipeline`]: the end-to-end conversion entry point

pub mod bms;
pub mod chart;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod lane;
pub mod pipeline;
pub mod report;
pub mod sample;
pub mod tempo;

// Re-export main types
pub use chart::Chart;
pub use config::{
    ChartConfig, HeaderFields, IdBase, LanePolicy, LongNotePolicy, OverflowPolicy,
    SampleKeyPolicy, UnresolvedPolicy,
};
pub use error::{ChartError, ParseError};
pub use event::{EventKind, NoteInterval, RawEvent};
pub use pipeline::{convert, ConvertOutcome, EngineState};
pub use report::RunReport;
pub use sample::{AudioSink, MemorySink, SampleId};
pub use tempo::{TempoChange, TempoMap, DEFAULT_TEMPO};

/// Crate version for tooling identification.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

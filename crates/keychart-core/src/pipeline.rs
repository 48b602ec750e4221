//! The end-to-end conversion run.
//!
//! [`convert`] is the single entry point: raw events in, assembled chart and
//! run report out. All run state is explicit values; nothing survives a call,
//! so converting the same inputs twice yields byte-identical documents.

use std::collections::BTreeMap;

use crate::bms;
use crate::chart::{Chart, Row, RowKey};
use crate::config::ChartConfig;
use crate::error::ChartError;
use crate::event::{reconstruct, RawEvent};
use crate::grid::Quantizer;
use crate::lane::{LaneAssigner, Placement};
use crate::report::RunReport;
use crate::sample::{AudioSink, SampleAssigner};
use crate::tempo::TempoMap;

/// Mutable engine state threaded through a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineState {
    /// Next sample identifier to issue.
    pub next_sample_id: u16,
}

impl EngineState {
    /// State for a fresh chart: identifiers start at 1.
    pub fn fresh() -> Self {
        Self { next_sample_id: 1 }
    }

    /// State resuming an existing chart: one past its highest identifier.
    pub fn for_chart(chart: &Chart) -> Self {
        Self {
            next_sample_id: chart.max_sample_id() + 1,
        }
    }
}

/// Result of a conversion run.
#[derive(Debug)]
pub struct ConvertOutcome {
    pub chart: Chart,
    pub report: RunReport,
    /// BLAKE3 hex digest of the rendered document.
    pub hash: String,
    /// Engine state after the run, for chaining further inputs.
    pub state: EngineState,
}

/// Converts an event stream into a chart.
///
/// With `existing` set the run extends that chart: its sample table and rows
/// are kept, new identifiers resume past the highest registered one, and any
/// `(measure, lane)` row this run recomputes replaces the old row wholesale.
///
/// Per-note anomalies accumulate in the report; identifier exhaustion, sink
/// failures, and invalid configuration abort with an error.
pub fn convert(
    events: &[RawEvent],
    tempo: &TempoMap,
    config: &ChartConfig,
    sink: &mut dyn AudioSink,
    existing: Option<Chart>,
) -> Result<ConvertOutcome, ChartError> {
    config.validate()?;

    let mut report = RunReport::default();
    let intervals = reconstruct(
        events,
        tempo,
        config.unresolved,
        config.fallback_duration_ms,
        &mut report,
    );

    let mut chart = match existing {
        Some(chart) => chart,
        None => Chart::new(config.header.clone(), config.resolution, config.id_base),
    };
    let state = EngineState::for_chart(&chart);

    let mut assigner = SampleAssigner::new(
        config.id_base,
        config.sample_key,
        config.min_clip_ms,
        state.next_sample_id,
    );
    let quantizer = Quantizer::new(config.header.bpm, config.resolution);
    let lanes = LaneAssigner::new(
        config.lane_policy,
        config.overflow,
        config.base_lane,
        config.lane_count,
    );

    // Rows built by this run; collision checks see only these, never rows
    // carried over from an existing chart, so recomputed rows replace cleanly.
    let mut working: BTreeMap<RowKey, Row> = BTreeMap::new();
    let resolution = config.resolution as usize;

    for interval in &intervals {
        let (id, exported) = assigner.assign(interval, sink, &mut report)?;
        if let Some(path) = exported {
            chart.register_sample(id, path);
        }

        let cells = quantizer.span_cells(
            interval.start,
            interval.end,
            config.long_note,
            config.long_note_threshold_ms,
        );
        let onset = cells[0];

        let placement = lanes.choose(interval.pitch, onset, |lane, cell| {
            working
                .get(&RowKey {
                    measure: cell.measure,
                    lane,
                })
                .and_then(|row| row.get(cell.subdivision as usize))
                .is_some_and(|c| c.is_some())
        });
        let lane = match placement {
            Placement::Placed(lane) => {
                report.notes_placed += 1;
                lane
            }
            Placement::Rerouted(lane) => {
                report.notes_rerouted += 1;
                lane
            }
            Placement::Dropped => {
                report.notes_dropped += 1;
                continue;
            }
        };

        for cell in cells {
            let row = working
                .entry(RowKey {
                    measure: cell.measure,
                    lane,
                })
                .or_insert_with(|| vec![None; resolution]);
            // Continuation cells never clobber an earlier note.
            if let Some(slot) = row.get_mut(cell.subdivision as usize) {
                if slot.is_none() {
                    *slot = Some(id);
                }
            }
        }
    }

    chart.replace_rows(working);

    let hash = blake3::hash(bms::render(&chart).as_bytes())
        .to_hex()
        .to_string();
    let state = EngineState {
        next_sample_id: assigner.next_id(),
    };

    Ok(ConvertOutcome {
        chart,
        report,
        hash,
        state,
    })
}

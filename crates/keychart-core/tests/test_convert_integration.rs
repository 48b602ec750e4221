//! Integration tests for the full conversion pipeline, from raw events to
//! rendered chart documents and back, including extend-mode round trips.

use keychart_core::{
    bms, convert, Chart, ChartConfig, EventKind, IdBase, LongNotePolicy, MemorySink,
    OverflowPolicy, RawEvent, SampleId, TempoChange, TempoMap,
};
use keychart_core::lane::Lane;
use pretty_assertions::assert_eq;

// =============================================================================
// Helper Functions
// =============================================================================

/// 480 ticks per beat with no tempo changes (120 BPM).
fn default_tempo() -> TempoMap {
    TempoMap::new(480, vec![])
}

fn on(tick: u64, pitch: u8) -> RawEvent {
    RawEvent {
        tick,
        kind: EventKind::NoteOn,
        pitch,
        velocity: 100,
        track: 0,
        channel: 0,
    }
}

fn off(tick: u64, pitch: u8) -> RawEvent {
    RawEvent {
        tick,
        kind: EventKind::NoteOff,
        pitch,
        velocity: 0,
        track: 0,
        channel: 0,
    }
}

/// One note per beat over one measure, four distinct pitches.
fn one_measure_scale() -> Vec<RawEvent> {
    let mut events = Vec::new();
    for (i, pitch) in [60u8, 62, 64, 65].iter().enumerate() {
        let start = i as u64 * 480;
        events.push(on(start, *pitch));
        events.push(off(start + 240, *pitch));
    }
    events
}

// =============================================================================
// End-to-End Conversion
// =============================================================================

#[test]
fn test_scale_renders_and_round_trips() {
    let config = ChartConfig::default();
    let outcome = convert(
        &one_measure_scale(),
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        None,
    )
    .unwrap();

    assert_eq!(outcome.chart.samples.len(), 4);
    assert_eq!(outcome.chart.note_count(), 4);
    assert_eq!(outcome.chart.measure_count(), 1);

    let text = bms::render(&outcome.chart);
    let parsed = bms::parse(&text, 16, IdBase::Decimal).unwrap();
    assert_eq!(parsed, outcome.chart);
}

#[test]
fn test_beats_land_on_quarter_subdivisions() {
    let config = ChartConfig::default();
    let outcome = convert(
        &one_measure_scale(),
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        None,
    )
    .unwrap();

    // Beats at 0, 0.5, 1.0, 1.5 s quantize to cells 0, 4, 8, 12.
    for (i, pitch) in [60u8, 62, 64, 65].iter().enumerate() {
        let lane = Lane::new(11 + pitch % 7);
        let cell = outcome.chart.cell(0, lane, i as u32 * 4);
        assert!(cell.is_some(), "pitch {pitch} missing at cell {}", i * 4);
    }
}

#[test]
fn test_tempo_change_shifts_later_notes() {
    // Halving the tempo after the first beat pushes later notes out in time.
    let tempo = TempoMap::new(
        480,
        vec![
            TempoChange {
                at_tick: 0,
                microseconds_per_beat: 500_000,
            },
            TempoChange {
                at_tick: 480,
                microseconds_per_beat: 1_000_000,
            },
        ],
    );
    let config = ChartConfig::default();
    let events = [on(0, 60), off(240, 60), on(960, 62), off(1200, 62)];
    let outcome = convert(&events, &tempo, &config, &mut MemorySink::new(), None).unwrap();

    // Tick 960 is 0.5 s + 1.0 s = 1.5 s: cell 12 of measure 0 at 120 BPM.
    let lane = Lane::new(11 + 62 % 7);
    assert!(outcome.chart.cell(0, lane, 12).is_some());
}

#[test]
fn test_rerun_is_byte_identical() {
    let config = ChartConfig::default();
    let events = one_measure_scale();
    let first = convert(
        &events,
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        None,
    )
    .unwrap();
    let second = convert(
        &events,
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        None,
    )
    .unwrap();
    assert_eq!(bms::render(&first.chart), bms::render(&second.chart));
    assert_eq!(first.hash, second.hash);
}

// =============================================================================
// Extend Mode
// =============================================================================

#[test]
fn test_extend_through_persisted_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.bms");
    let config = ChartConfig::default();

    let first = convert(
        &one_measure_scale(),
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        None,
    )
    .unwrap();
    bms::save_atomic(&first.chart, &path).unwrap();

    // Load the document back and extend it with a second measure.
    let existing = bms::load(&path, config.resolution, config.id_base).unwrap();
    assert_eq!(existing, first.chart);

    let more = [on(1920, 72), off(1920 + 240, 72)];
    let second = convert(
        &more,
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        Some(existing),
    )
    .unwrap();
    bms::save_atomic(&second.chart, &path).unwrap();

    let final_chart = bms::load(&path, config.resolution, config.id_base).unwrap();
    assert_eq!(final_chart.samples.len(), 5);
    assert_eq!(final_chart.max_sample_id(), 5);
    assert_eq!(final_chart.measure_count(), 2);
    // First-measure rows survived untouched.
    assert_eq!(final_chart.note_count(), 5);
}

#[test]
fn test_extend_same_events_does_not_duplicate() {
    let config = ChartConfig::default();
    let events = one_measure_scale();
    let first = convert(
        &events,
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        None,
    )
    .unwrap();
    let again = convert(
        &events,
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        Some(first.chart.clone()),
    )
    .unwrap();
    assert_eq!(again.chart.note_count(), first.chart.note_count());
    assert_eq!(again.chart.grid, first.chart.grid);
}

// =============================================================================
// Policies Under Load
// =============================================================================

#[test]
fn test_chord_spreads_with_first_free_lanes() {
    let config = ChartConfig {
        lane_policy: keychart_core::LanePolicy::FirstFree,
        ..Default::default()
    };
    // Three simultaneous pitches that collide under modulo assignment.
    let events = [
        on(0, 60),
        on(0, 67),
        on(0, 74),
        off(240, 60),
        off(240, 67),
        off(240, 74),
    ];
    let outcome = convert(
        &events,
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        None,
    )
    .unwrap();
    assert_eq!(outcome.report.notes_placed, 3);
    assert_eq!(outcome.report.notes_dropped, 0);
    for lane in [11u8, 12, 13] {
        assert!(outcome.chart.cell(0, Lane::new(lane), 0).is_some());
    }
}

#[test]
fn test_overflow_reroute_lands_in_bgm_row() {
    let config = ChartConfig {
        overflow: OverflowPolicy::BgmLane,
        ..Default::default()
    };
    let events = [on(0, 60), on(0, 67), off(240, 60), off(240, 67)];
    let outcome = convert(
        &events,
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        None,
    )
    .unwrap();
    assert_eq!(outcome.report.notes_rerouted, 1);
    let text = bms::render(&outcome.chart);
    assert!(text.contains("#00001:"));
}

#[test]
fn test_long_note_fill_span_renders_continuous_row() {
    let config = ChartConfig {
        long_note: LongNotePolicy::FillSpan,
        sample_key: keychart_core::SampleKeyPolicy::PitchDuration,
        ..Default::default()
    };
    // One-second hold: cells 0 through 8 of measure 0.
    let events = [on(0, 60), off(960, 60)];
    let outcome = convert(
        &events,
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        None,
    )
    .unwrap();
    let lane = Lane::new(11 + 60 % 7);
    for sub in 0..=8 {
        assert!(outcome.chart.cell(0, lane, sub).is_some(), "cell {sub}");
    }
    assert!(outcome.chart.cell(0, lane, 9).is_none());
}

#[test]
fn test_base36_chart_round_trips_past_decimal_capacity() {
    let config = ChartConfig {
        id_base: IdBase::Base36,
        base_lane: 11,
        lane_count: 7,
        lane_policy: keychart_core::LanePolicy::FirstFree,
        ..Default::default()
    };
    // 120 distinct pitches would exhaust decimal identifiers.
    let mut events = Vec::new();
    for i in 0..120u64 {
        let pitch = (i % 128) as u8;
        events.push(on(i * 480, pitch));
        events.push(off(i * 480 + 240, pitch));
    }
    let outcome = convert(
        &events,
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        None,
    )
    .unwrap();
    assert_eq!(outcome.chart.samples.len(), 120);

    let text = bms::render(&outcome.chart);
    let parsed = bms::parse(&text, 16, IdBase::Base36).unwrap();
    assert_eq!(parsed, outcome.chart);
}

#[test]
fn test_decimal_exhaustion_is_fatal() {
    let config = ChartConfig::default();
    let mut events = Vec::new();
    for i in 0..100u64 {
        let pitch = (i % 128) as u8;
        events.push(on(i * 480, pitch));
        events.push(off(i * 480 + 240, pitch));
    }
    let err = convert(
        &events,
        &default_tempo(),
        &config,
        &mut MemorySink::new(),
        None,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        keychart_core::ChartError::SampleSpaceExhausted { capacity: 99 }
    ));
}

// =============================================================================
// Document Compatibility
// =============================================================================

#[test]
fn test_parse_hand_written_document() {
    let text = "\
*---------------------- HEADER FIELD
#PLAYER 1
#GENRE MIDI_EXPORT
#TITLE ExampleSong
#ARTIST AI
#BPM 120
#PLAYLEVEL 1
#RANK 2
#LNTYPE 1
#WAV01 notes/note_01.wav
#WAV02 notes/note_02.wav

*---------------------- MAIN DATA FIELD
#00011:01000000000000000200000000000000
";
    let chart = bms::parse(text, 16, IdBase::Decimal).unwrap();
    assert_eq!(chart.header.title, "ExampleSong");
    assert_eq!(chart.samples.len(), 2);
    let id2 = SampleId::new(2, IdBase::Decimal).unwrap();
    assert_eq!(chart.cell(0, Lane::new(11), 8), Some(id2));
}

#[test]
fn test_empty_chart_still_renders_all_sections() {
    let chart = Chart::new(Default::default(), 16, IdBase::Decimal);
    let text = bms::render(&chart);
    assert!(text.contains(bms::HEADER_MARKER));
    assert!(text.contains(bms::WAV_MARKER));
    assert!(text.contains(bms::DATA_MARKER));
    let parsed = bms::parse(&text, 16, IdBase::Decimal).unwrap();
    assert_eq!(parsed, chart);
}

//! keychart MIDI Source - Standard MIDI File Decoding
//!
//! Decodes SMF bytes into the raw event stream the conversion engine
//! consumes: note on/off events with absolute ticks plus the tempo changes
//! needed to build a [`keychart_core::TempoMap`]. Nothing is paired or
//! quantized here; the engine owns those semantics.
//!
//! Tracks are walked in file order with per-track delta accumulation, and
//! events are appended track by track, so the engine's stable sort keeps
//! same-tick events in file order.

use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use thiserror::Error;

use keychart_core::{EventKind, RawEvent, TempoChange, TempoMap};

/// Errors raised while decoding a MIDI file.
#[derive(Error, Debug)]
pub enum MidiLoadError {
    #[error("malformed MIDI data: {0}")]
    Malformed(#[from] midly::Error),

    /// SMPTE timecode division has no beat grid to quantize against.
    #[error("unsupported SMPTE timecode division")]
    UnsupportedTiming,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A decoded event stream ready for conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedStream {
    pub events: Vec<RawEvent>,
    pub tempo_changes: Vec<TempoChange>,
    pub ticks_per_beat: u32,
}

impl LoadedStream {
    /// Builds the tempo map for this stream.
    pub fn tempo_map(&self) -> TempoMap {
        TempoMap::new(self.ticks_per_beat, self.tempo_changes.clone())
    }

    /// BPM of the first tempo segment (120 when the file declares none).
    pub fn initial_bpm(&self) -> f64 {
        self.tempo_map().initial_bpm()
    }
}

/// Decodes SMF bytes into a [`LoadedStream`].
///
/// Note events keep their source track index and wire channel; velocity-0
/// `NoteOn` is passed through as an on-event with velocity 0, which the
/// engine treats as an off. Meta events other than tempo are skipped.
pub fn load_stream(bytes: &[u8]) -> Result<LoadedStream, MidiLoadError> {
    let smf = Smf::parse(bytes)?;
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(ticks) => u32::from(ticks.as_int()),
        Timing::Timecode(..) => return Err(MidiLoadError::UnsupportedTiming),
    };

    let mut events = Vec::new();
    let mut tempo_changes = Vec::new();

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut tick: u64 = 0;
        for event in track {
            tick += u64::from(event.delta.as_int());
            match &event.kind {
                TrackEventKind::Midi { channel, message } => match message {
                    MidiMessage::NoteOn { key, vel } => events.push(RawEvent {
                        tick,
                        kind: EventKind::NoteOn,
                        pitch: key.as_int(),
                        velocity: vel.as_int(),
                        track: track_idx as u16,
                        channel: channel.as_int(),
                    }),
                    MidiMessage::NoteOff { key, vel } => events.push(RawEvent {
                        tick,
                        kind: EventKind::NoteOff,
                        pitch: key.as_int(),
                        velocity: vel.as_int(),
                        track: track_idx as u16,
                        channel: channel.as_int(),
                    }),
                    _ => {}
                },
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    tempo_changes.push(TempoChange {
                        at_tick: tick,
                        microseconds_per_beat: tempo.as_int(),
                    });
                }
                _ => {}
            }
        }
    }

    Ok(LoadedStream {
        events,
        tempo_changes,
        ticks_per_beat,
    })
}

/// Reads and decodes a MIDI file from disk.
pub fn load_file(path: &Path) -> Result<LoadedStream, MidiLoadError> {
    let bytes = std::fs::read(path)?;
    load_stream(&bytes)
}

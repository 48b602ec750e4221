//! Raw note events and interval reconstruction.
//!
//! Input streams carry independent on/off events; the grid wants notes with a
//! start and an end. [`reconstruct`] pairs them. Overlapped retriggers of the
//! same pitch are legal in the wild, so open notes are queued per
//! `(track, pitch)` and an off-event always closes the oldest open note.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::UnresolvedPolicy;
use crate::report::RunReport;
use crate::tempo::TempoMap;

/// Kind of a raw timed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NoteOn,
    NoteOff,
}

/// A single timed event from an input stream.
///
/// A `NoteOn` with velocity 0 is treated as an off-event, per the usual wire
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub tick: u64,
    pub kind: EventKind,
    pub pitch: u8,
    pub velocity: u8,
    /// Index of the source track within the stream.
    pub track: u16,
    /// Wire channel, carried through for lane grouping.
    pub channel: u8,
}

impl RawEvent {
    /// True when this event opens a note.
    pub fn is_onset(&self) -> bool {
        self.kind == EventKind::NoteOn && self.velocity > 0
    }
}

/// A reconstructed note with wall-clock endpoints in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteInterval {
    pub track: u16,
    pub channel: u8,
    pub pitch: u8,
    pub start_tick: u64,
    pub start: f64,
    pub end: f64,
}

impl NoteInterval {
    /// Interval duration in whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (((self.end - self.start) * 1000.0).round().max(0.0)) as u64
    }
}

/// Pairs on/off events into note intervals.
///
/// Events are stably sorted by tick (ties keep input order), then swept once.
/// Unmatched off-events are counted and ignored. Notes still open at
/// end-of-stream are closed per `policy`; the fallback duration applies to
/// [`UnresolvedPolicy::MinimumDuration`].
///
/// # Returns
/// Intervals sorted by start tick, ties in onset order.
pub fn reconstruct(
    events: &[RawEvent],
    tempo: &TempoMap,
    policy: UnresolvedPolicy,
    fallback_duration_ms: u32,
    report: &mut RunReport,
) -> Vec<NoteInterval> {
    let mut sorted: Vec<&RawEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.tick);

    struct Open {
        seq: usize,
        channel: u8,
        tick: u64,
    }

    let mut queues: BTreeMap<(u16, u8), VecDeque<Open>> = BTreeMap::new();
    let mut intervals: Vec<(usize, NoteInterval)> = Vec::new();
    let mut seq = 0usize;
    let last_tick = sorted.last().map(|e| e.tick).unwrap_or(0);

    for event in &sorted {
        let key = (event.track, event.pitch);
        if event.is_onset() {
            queues.entry(key).or_default().push_back(Open {
                seq,
                channel: event.channel,
                tick: event.tick,
            });
            seq += 1;
        } else {
            // Oldest open note of this (track, pitch) wins.
            match queues.get_mut(&key).and_then(VecDeque::pop_front) {
                Some(open) => intervals.push((
                    open.seq,
                    NoteInterval {
                        track: event.track,
                        channel: open.channel,
                        pitch: event.pitch,
                        start_tick: open.tick,
                        start: tempo.time_at(open.tick),
                        end: tempo.time_at(event.tick),
                    },
                )),
                None => report.unmatched_off_events += 1,
            }
        }
    }

    // Close anything still open at end-of-stream.
    let stream_end = tempo.time_at(last_tick);
    for ((track, pitch), queue) in queues {
        for open in queue {
            report.unresolved_intervals += 1;
            let start = tempo.time_at(open.tick);
            let end = match policy {
                UnresolvedPolicy::ExtendToEnd => stream_end.max(start),
                UnresolvedPolicy::MinimumDuration => {
                    start + f64::from(fallback_duration_ms) / 1000.0
                }
            };
            intervals.push((
                open.seq,
                NoteInterval {
                    track,
                    channel: open.channel,
                    pitch,
                    start_tick: open.tick,
                    start,
                    end,
                },
            ));
        }
    }

    intervals.sort_by_key(|(seq, iv)| (iv.start_tick, *seq));
    intervals.into_iter().map(|(_, iv)| iv).collect()
}

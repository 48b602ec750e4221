//! Sample deduplication and identifier assignment.
//!
//! Every placed note references an audio clip by a two-digit identifier. The
//! identifier space is tiny (99 decimal slots, 1295 in base-36), so intervals
//! are deduplicated by a configurable key and a clip is exported only the
//! first time its key appears. Identifier `00` is never issued: it is the
//! empty-cell placeholder in the data rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{IdBase, SampleKeyPolicy};
use crate::error::ChartError;
use crate::event::NoteInterval;
use crate::report::RunReport;

const DIGITS_36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A sample slot identifier, always in `1..=capacity` for its base.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SampleId(u16);

impl SampleId {
    /// Issuable identifiers for a base; `00` is reserved for empty cells.
    pub fn capacity(base: IdBase) -> u16 {
        match base {
            IdBase::Decimal => 99,
            IdBase::Base36 => 36 * 36 - 1,
        }
    }

    /// Wraps a raw value, rejecting zero and out-of-range values.
    pub fn new(value: u16, base: IdBase) -> Option<Self> {
        (value >= 1 && value <= Self::capacity(base)).then_some(Self(value))
    }

    pub fn value(self) -> u16 {
        self.0
    }

    /// Renders the fixed two-digit form used in sample tables and data rows.
    pub fn render(self, base: IdBase) -> String {
        match base {
            IdBase::Decimal => format!("{:02}", self.0),
            IdBase::Base36 => {
                let hi = DIGITS_36[usize::from(self.0 / 36)] as char;
                let lo = DIGITS_36[usize::from(self.0 % 36)] as char;
                format!("{hi}{lo}")
            }
        }
    }

    /// Parses a two-digit identifier; `None` for `00`, bad digits, or wrong
    /// length.
    pub fn parse(text: &str, base: IdBase) -> Option<Self> {
        if text.len() != 2 {
            return None;
        }
        let value = match base {
            IdBase::Decimal => text.parse::<u16>().ok()?,
            IdBase::Base36 => {
                let digit = |c: char| {
                    DIGITS_36
                        .iter()
                        .position(|&d| d as char == c.to_ascii_uppercase())
                };
                let mut chars = text.chars();
                let hi = digit(chars.next()?)? as u16;
                let lo = digit(chars.next()?)? as u16;
                hi * 36 + lo
            }
        };
        Self::new(value, base)
    }
}

/// Deduplication key for one interval, per the configured policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SampleKey {
    Pitch(u8),
    PitchDuration(u8, u64),
    TrackOnset(u16, u64),
}

impl SampleKey {
    pub fn for_interval(policy: SampleKeyPolicy, interval: &NoteInterval) -> Self {
        match policy {
            SampleKeyPolicy::Pitch => Self::Pitch(interval.pitch),
            SampleKeyPolicy::PitchDuration => {
                Self::PitchDuration(interval.pitch, interval.duration_ms())
            }
            SampleKeyPolicy::TrackOnset => Self::TrackOnset(
                interval.track,
                (interval.start * 1000.0).round().max(0.0) as u64,
            ),
        }
    }
}

/// Receives clip export requests for newly registered samples.
///
/// The returned string is the path stored in the chart's sample table,
/// relative to the chart document.
pub trait AudioSink {
    fn export_clip(&mut self, start: f64, end: f64, name: &str) -> Result<String, String>;
}

/// Sink that records requests without touching the filesystem.
///
/// Used by tests and dry runs; the recorded name doubles as the table path.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub exported: Vec<(f64, f64, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioSink for MemorySink {
    fn export_clip(&mut self, start: f64, end: f64, name: &str) -> Result<String, String> {
        self.exported.push((start, end, name.to_string()));
        Ok(format!("{name}.wav"))
    }
}

/// Issues identifiers and exports clips, one per distinct key.
#[derive(Debug)]
pub struct SampleAssigner {
    base: IdBase,
    policy: SampleKeyPolicy,
    min_clip_ms: u32,
    next_id: u16,
    assigned: BTreeMap<SampleKey, SampleId>,
}

impl SampleAssigner {
    /// # Arguments
    /// * `next_id` - first identifier to issue; 1 for a fresh chart, one past
    ///   the highest registered identifier when extending
    pub fn new(base: IdBase, policy: SampleKeyPolicy, min_clip_ms: u32, next_id: u16) -> Self {
        Self {
            base,
            policy,
            min_clip_ms,
            next_id: next_id.max(1),
            assigned: BTreeMap::new(),
        }
    }

    /// Resolves the identifier for an interval.
    ///
    /// A previously seen key reuses its identifier with no export. A new key
    /// takes the next identifier and exports its clip through `sink`; clips
    /// shorter than the configured minimum are extended forward before
    /// export.
    ///
    /// # Returns
    /// The identifier, plus `Some(path)` when a clip was exported.
    pub fn assign(
        &mut self,
        interval: &NoteInterval,
        sink: &mut dyn AudioSink,
        report: &mut RunReport,
    ) -> Result<(SampleId, Option<String>), ChartError> {
        let key = SampleKey::for_interval(self.policy, interval);
        if let Some(&id) = self.assigned.get(&key) {
            report.samples_reused += 1;
            return Ok((id, None));
        }

        let id = SampleId::new(self.next_id, self.base).ok_or(
            ChartError::SampleSpaceExhausted {
                capacity: SampleId::capacity(self.base),
            },
        )?;
        self.next_id += 1;

        let min_len = f64::from(self.min_clip_ms) / 1000.0;
        let end = interval.end.max(interval.start + min_len);
        let name = format!("note_{}", id.render(self.base));
        let path = sink
            .export_clip(interval.start, end, &name)
            .map_err(|reason| ChartError::ClipExport { name, reason })?;
        report.clips_exported += 1;

        self.assigned.insert(key, id);
        Ok((id, Some(path)))
    }

    /// Identifier the next new key would take.
    pub fn next_id(&self) -> u16 {
        self.next_id
    }
}

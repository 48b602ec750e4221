//! Conversion configuration and policy knobs.
//!
//! A [`ChartConfig`] is a plain serde-serializable value so that a conversion
//! profile can live in a JSON file and be shared between runs. All policy
//! choices that change chart output are made here; the pipeline itself holds
//! no hidden settings.

use serde::{Deserialize, Serialize};

use crate::error::ChartError;

/// Grid resolutions the serializer accepts (cells per measure).
pub const SUPPORTED_RESOLUTIONS: [u32; 4] = [16, 48, 192, 768];

/// Numeric base for rendering sample identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdBase {
    /// Two decimal digits, identifiers 01-99.
    #[default]
    Decimal,
    /// Two base-36 digits (0-9, A-Z), identifiers 01-ZZ.
    Base36,
}

/// How note intervals are deduplicated into sample slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SampleKeyPolicy {
    /// One sample per distinct pitch.
    #[default]
    Pitch,
    /// One sample per distinct (pitch, duration) pair, duration in whole ms.
    PitchDuration,
    /// One sample per distinct (track, onset) pair, onset rounded to ms.
    TrackOnset,
}

/// How a sustained note is written onto the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LongNotePolicy {
    /// Mark only the onset and release cells.
    #[default]
    MarkEndpoints,
    /// Fill every cell from onset through release.
    FillSpan,
}

/// How the playable lane for a note is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LanePolicy {
    /// Lane derived from the pitch modulo the lane count.
    #[default]
    PitchModulo,
    /// First lane in the group whose onset cell is free.
    FirstFree,
}

/// What happens when no playable lane can take a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the note and count it.
    #[default]
    Drop,
    /// Reroute the note to the background channel.
    BgmLane,
}

/// How intervals still open at end-of-stream are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Close at the configured fallback duration past the onset.
    #[default]
    MinimumDuration,
    /// Close at the final event tick of the stream.
    ExtendToEnd,
}

/// Metadata written into the chart header section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderFields {
    pub player: u8,
    pub genre: String,
    pub title: String,
    pub artist: String,
    pub bpm: f64,
    pub play_level: u8,
    pub rank: u8,
    pub ln_type: u8,
}

impl Default for HeaderFields {
    fn default() -> Self {
        Self {
            player: 1,
            genre: "MIDI_EXPORT".to_string(),
            title: "Untitled".to_string(),
            artist: "Unknown".to_string(),
            bpm: 120.0,
            play_level: 1,
            rank: 2,
            ln_type: 1,
        }
    }
}

/// Complete configuration for one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub header: HeaderFields,
    /// Cells per measure; must be one of [`SUPPORTED_RESOLUTIONS`].
    pub resolution: u32,
    pub id_base: IdBase,
    pub sample_key: SampleKeyPolicy,
    pub long_note: LongNotePolicy,
    /// Minimum duration in ms for an interval to count as a long note.
    pub long_note_threshold_ms: u32,
    /// Clips shorter than this are extended forward to this length.
    pub min_clip_ms: u32,
    pub unresolved: UnresolvedPolicy,
    /// Duration in ms assigned by [`UnresolvedPolicy::MinimumDuration`].
    pub fallback_duration_ms: u32,
    pub lane_policy: LanePolicy,
    /// First playable lane channel (classic layouts start at 11).
    pub base_lane: u8,
    /// Number of playable lanes starting at `base_lane`.
    pub lane_count: u8,
    pub overflow: OverflowPolicy,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            header: HeaderFields::default(),
            resolution: 16,
            id_base: IdBase::Decimal,
            sample_key: SampleKeyPolicy::Pitch,
            long_note: LongNotePolicy::MarkEndpoints,
            long_note_threshold_ms: 300,
            min_clip_ms: 30,
            unresolved: UnresolvedPolicy::MinimumDuration,
            fallback_duration_ms: 100,
            lane_policy: LanePolicy::PitchModulo,
            base_lane: 11,
            lane_count: 7,
            overflow: OverflowPolicy::Drop,
        }
    }
}

impl ChartConfig {
    /// Checks the configuration before a run starts.
    ///
    /// # Returns
    /// `Ok(())` when every field is usable, otherwise
    /// [`ChartError::InvalidConfig`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ChartError> {
        if !SUPPORTED_RESOLUTIONS.contains(&self.resolution) {
            return Err(ChartError::InvalidConfig(format!(
                "unsupported resolution {} (supported: {:?})",
                self.resolution, SUPPORTED_RESOLUTIONS
            )));
        }
        if self.lane_count == 0 {
            return Err(ChartError::InvalidConfig(
                "lane_count must be at least 1".to_string(),
            ));
        }
        if self.base_lane < 2 {
            return Err(ChartError::InvalidConfig(format!(
                "base_lane {} collides with the background channel",
                self.base_lane
            )));
        }
        if u32::from(self.base_lane) + u32::from(self.lane_count) > 100 {
            return Err(ChartError::InvalidConfig(format!(
                "lane range {}..{} exceeds the two-digit channel space",
                self.base_lane,
                u32::from(self.base_lane) + u32::from(self.lane_count)
            )));
        }
        if !(self.header.bpm > 0.0) {
            return Err(ChartError::InvalidConfig(format!(
                "bpm must be positive, got {}",
                self.header.bpm
            )));
        }
        Ok(())
    }
}

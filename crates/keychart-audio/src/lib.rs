//! keychart Audio Source - WAV Slicing and Clip Export
//!
//! Reads a source recording once, then cuts sample-accurate clips out of it
//! as the engine registers key sounds. Clips are written as 16-bit PCM WAV
//! regardless of the source format so the exported set is uniform.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec};
use thiserror::Error;

use keychart_core::AudioSink;

/// Errors raised while reading or writing audio.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("unsupported sample format: {bits}-bit {format:?}")]
    UnsupportedFormat { bits: u16, format: SampleFormat },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully decoded source recording, ready for clipping.
///
/// Samples are held interleaved as 16-bit PCM; float sources are converted
/// on load with clipping at full scale.
#[derive(Debug, Clone)]
pub struct WavClipSource {
    samples: Vec<i16>,
    channels: u16,
    sample_rate: u32,
}

impl WavClipSource {
    /// Reads and decodes a whole WAV file.
    ///
    /// Accepts 16-bit integer and 32-bit float sources.
    pub fn open(path: &Path) -> Result<Self, AudioError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 16) => {
                reader.samples::<i16>().collect::<Result<_, _>>()?
            }
            (SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * 32767.0).round() as i16))
                .collect::<Result<_, _>>()?,
            (format, bits) => {
                return Err(AudioError::UnsupportedFormat { bits, format });
            }
        };
        Ok(Self {
            samples,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frame_count() as f64 / f64::from(self.sample_rate)
    }

    /// Cuts the interleaved samples for a time span, clamped to the
    /// recording. An inverted or fully out-of-range span yields silence of
    /// length zero.
    pub fn clip(&self, start: f64, end: f64) -> &[i16] {
        let channels = usize::from(self.channels.max(1));
        let to_frame = |t: f64| ((t.max(0.0) * f64::from(self.sample_rate)) as usize)
            .min(self.frame_count());
        let start_frame = to_frame(start);
        let end_frame = to_frame(end).max(start_frame);
        &self.samples[start_frame * channels..end_frame * channels]
    }

    fn spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }
}

/// Writes clips from one source into an output directory.
///
/// The path returned for each clip is relative to the chart document:
/// `<dir-name>/<name>.wav`, matching how sample tables reference clips that
/// sit next to the chart.
#[derive(Debug)]
pub struct ClipExporter {
    source: WavClipSource,
    out_dir: PathBuf,
    dir_name: String,
}

impl ClipExporter {
    /// Creates the output directory and wraps the source.
    pub fn new(source: WavClipSource, out_dir: &Path) -> Result<Self, AudioError> {
        std::fs::create_dir_all(out_dir)?;
        let dir_name = out_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            source,
            out_dir: out_dir.to_path_buf(),
            dir_name,
        })
    }

    fn write_clip(&self, start: f64, end: f64, name: &str) -> Result<String, AudioError> {
        let file = std::fs::File::create(self.out_dir.join(format!("{name}.wav")))?;
        let mut writer = hound::WavWriter::new(BufWriter::new(file), self.source.spec())?;
        for &sample in self.source.clip(start, end) {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(format!("{}/{name}.wav", self.dir_name))
    }
}

impl AudioSink for ClipExporter {
    fn export_clip(&mut self, start: f64, end: f64, name: &str) -> Result<String, String> {
        self.write_clip(start, end, name).map_err(|e| e.to_string())
    }
}

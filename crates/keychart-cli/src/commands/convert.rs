//! Convert command implementation
//!
//! Turns one or more MIDI/WAV input pairs into a chart document plus its
//! exported key-sound clips. Inputs are converted in order against the same
//! chart, so sample identifiers stay unique across the whole set.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use keychart_core::{bms, convert, Chart, ChartConfig, IdBase, MemorySink, RunReport};
use keychart_audio::{ClipExporter, WavClipSource};

/// Optional overrides applied on top of the configuration profile.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub bpm: Option<f64>,
    pub resolution: Option<u32>,
    pub base36: bool,
    pub title: Option<String>,
}

/// Run the convert command
///
/// # Arguments
/// * `midi_paths` - MIDI input files, one per instrument group
/// * `audio_paths` - WAV source per MIDI input (empty allowed with `dry_run`)
/// * `out` - chart document output path
/// * `out_dir` - directory for exported clips
/// * `append` - extend the existing chart at `out` instead of replacing it
/// * `config_path` - optional JSON configuration profile
/// * `overrides` - flag-level overrides applied after the profile
/// * `lane_per_input` - pin each input to its own single lane
/// * `dry_run` - convert without writing clips or the chart
///
/// # Returns
/// Exit code: 0 on success, 1 on error
#[allow(clippy::too_many_arguments)]
pub fn run(
    midi_paths: &[String],
    audio_paths: &[String],
    out: &str,
    out_dir: &str,
    append: bool,
    config_path: Option<&str>,
    overrides: &Overrides,
    lane_per_input: bool,
    dry_run: bool,
) -> Result<ExitCode> {
    if midi_paths.is_empty() {
        anyhow::bail!("at least one --midi input is required");
    }
    if !dry_run && audio_paths.len() != midi_paths.len() {
        anyhow::bail!(
            "expected one --audio per --midi ({} midi, {} audio); use --dry-run to skip clip export",
            midi_paths.len(),
            audio_paths.len()
        );
    }

    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, overrides);

    let out_path = Path::new(out);
    let mut chart: Option<Chart> = if append && out_path.exists() {
        let existing = bms::load(out_path, config.resolution, config.id_base)
            .with_context(|| format!("failed to parse existing chart: {out}"))?;
        // Extending: the grid tempo is the one the document was built with.
        if overrides.bpm.is_none() {
            config.header.bpm = existing.header.bpm;
        }
        Some(existing)
    } else {
        None
    };

    let mut totals = RunReport::default();
    let mut hash = String::new();

    for (index, midi_path) in midi_paths.iter().enumerate() {
        let stream = keychart_midi::load_file(Path::new(midi_path))
            .with_context(|| format!("failed to load MIDI file: {midi_path}"))?;
        let tempo = stream.tempo_map();

        let mut input_config = config.clone();
        if overrides.bpm.is_none() && index == 0 && chart.is_none() {
            // Take the chart tempo from the first input's initial tempo.
            input_config.header.bpm = stream.initial_bpm();
            config.header.bpm = input_config.header.bpm;
        } else {
            input_config.header.bpm = config.header.bpm;
        }
        if lane_per_input {
            input_config.base_lane = config.base_lane + index as u8;
            input_config.lane_count = 1;
        }

        let outcome = if dry_run {
            let mut sink = MemorySink::new();
            convert(&stream.events, &tempo, &input_config, &mut sink, chart.take())?
        } else {
            let source = WavClipSource::open(Path::new(&audio_paths[index]))
                .with_context(|| format!("failed to open audio file: {}", audio_paths[index]))?;
            let mut sink = ClipExporter::new(source, Path::new(out_dir))?;
            convert(&stream.events, &tempo, &input_config, &mut sink, chart.take())?
        };

        totals.merge(&outcome.report);
        hash = outcome.hash;
        chart = Some(outcome.chart);
    }

    // One or more inputs were converted, so the chart always exists here.
    let chart = chart.context("no chart produced")?;
    if !dry_run {
        bms::save_atomic(&chart, out_path)?;
    }

    let label = if dry_run { "Dry run:" } else { "Chart:" };
    println!("{} {}", label.cyan().bold(), out);
    println!(
        "  {} measures, {} samples registered",
        chart.measure_count(),
        chart.samples.len()
    );
    println!("  {totals}");
    println!("  {} {}", "hash:".dimmed(), hash);

    Ok(ExitCode::SUCCESS)
}

fn load_config(path: Option<&str>) -> Result<ChartConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {path}"))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config file: {path}"))
        }
        None => Ok(ChartConfig::default()),
    }
}

fn apply_overrides(config: &mut ChartConfig, overrides: &Overrides) {
    if let Some(bpm) = overrides.bpm {
        config.header.bpm = bpm;
    }
    if let Some(resolution) = overrides.resolution {
        config.resolution = resolution;
    }
    if overrides.base36 {
        config.id_base = IdBase::Base36;
    }
    if let Some(title) = &overrides.title {
        config.header.title = title.clone();
    }
}

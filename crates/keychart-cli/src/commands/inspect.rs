//! Inspect command implementation
//!
//! Parses an existing chart document and prints a summary: header metadata,
//! registered samples, and row statistics per lane.

use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

use keychart_core::{bms, IdBase};
use keychart_core::lane::Lane;

/// Run the inspect command
///
/// # Arguments
/// * `chart_path` - path to the chart document
/// * `resolution` - cells per measure the document was written with
/// * `base36` - parse sample identifiers as base-36
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(chart_path: &str, resolution: u32, base36: bool) -> Result<ExitCode> {
    let id_base = if base36 {
        IdBase::Base36
    } else {
        IdBase::Decimal
    };
    let chart = bms::load(Path::new(chart_path), resolution, id_base)
        .with_context(|| format!("failed to parse chart: {chart_path}"))?;

    println!("{} {}", "Chart:".cyan().bold(), chart_path);
    println!("  {} {}", "title:".dimmed(), chart.header.title);
    println!("  {} {}", "artist:".dimmed(), chart.header.artist);
    println!("  {} {}", "bpm:".dimmed(), chart.header.bpm);
    println!("  {} {}", "measures:".dimmed(), chart.measure_count());
    println!("  {} {}", "samples:".dimmed(), chart.samples.len());
    println!("  {} {}", "notes:".dimmed(), chart.note_count());

    let mut per_lane: BTreeMap<Lane, usize> = BTreeMap::new();
    for (key, row) in &chart.grid {
        *per_lane.entry(key.lane).or_default() +=
            row.iter().filter(|c| c.is_some()).count();
    }
    if !per_lane.is_empty() {
        println!("  {}", "notes per lane:".dimmed());
        for (lane, count) in per_lane {
            println!("    {}: {}", lane.render(), count);
        }
    }

    Ok(ExitCode::SUCCESS)
}

//! keychart CLI - Command-line interface for chart conversion
//!
//! This binary converts MIDI files plus their source recordings into
//! quantized key-sound chart documents, and inspects existing documents.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

// Use modules from the library crate
use keychart_cli::commands;

/// keychart - MIDI to key-sound chart conversion
#[derive(Parser)]
#[command(name = "keychart")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert MIDI/WAV input pairs into a chart document
    Convert {
        /// MIDI input file (repeat for multiple instrument groups)
        #[arg(short, long = "midi", required = true)]
        midi: Vec<String>,

        /// WAV source per MIDI input, in the same order
        #[arg(short, long = "audio")]
        audio: Vec<String>,

        /// Chart document output path
        #[arg(short, long)]
        out: String,

        /// Directory for exported key-sound clips
        #[arg(long, default_value = "notes")]
        out_dir: String,

        /// Extend the existing chart at --out instead of replacing it
        #[arg(long)]
        append: bool,

        /// JSON configuration profile (flags override its fields)
        #[arg(short, long)]
        config: Option<String>,

        /// Override the chart tempo instead of reading it from the MIDI
        #[arg(long)]
        bpm: Option<f64>,

        /// Cells per measure (16, 48, 192, or 768)
        #[arg(long)]
        resolution: Option<u32>,

        /// Use base-36 sample identifiers (1295 slots instead of 99)
        #[arg(long)]
        base36: bool,

        /// Chart title written to the header
        #[arg(long)]
        title: Option<String>,

        /// Pin each input to its own single lane, starting at the base lane
        #[arg(long)]
        lane_per_input: bool,

        /// Convert and report without writing clips or the chart
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse an existing chart document and print a summary
    Inspect {
        /// Path to the chart document
        #[arg(short, long)]
        chart: String,

        /// Cells per measure the document was written with
        #[arg(long, default_value = "16")]
        resolution: u32,

        /// Parse sample identifiers as base-36
        #[arg(long)]
        base36: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            midi,
            audio,
            out,
            out_dir,
            append,
            config,
            bpm,
            resolution,
            base36,
            title,
            lane_per_input,
            dry_run,
        } => commands::convert::run(
            &midi,
            &audio,
            &out,
            &out_dir,
            append,
            config.as_deref(),
            &commands::convert::Overrides {
                bpm,
                resolution,
                base36,
                title,
            },
            lane_per_input,
            dry_run,
        ),
        Commands::Inspect {
            chart,
            resolution,
            base36,
        } => commands::inspect::run(&chart, resolution, base36),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_convert() {
        let cli = Cli::try_parse_from([
            "keychart", "convert", "--midi", "song.mid", "--audio", "song.wav", "--out",
            "song.bms",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert {
                midi,
                audio,
                out,
                out_dir,
                append,
                dry_run,
                ..
            } => {
                assert_eq!(midi, vec!["song.mid"]);
                assert_eq!(audio, vec!["song.wav"]);
                assert_eq!(out, "song.bms");
                assert_eq!(out_dir, "notes");
                assert!(!append);
                assert!(!dry_run);
            }
            _ => panic!("expected convert command"),
        }
    }

    #[test]
    fn test_cli_parses_repeated_inputs() {
        let cli = Cli::try_parse_from([
            "keychart",
            "convert",
            "--midi",
            "drums.mid",
            "--midi",
            "bass.mid",
            "--audio",
            "drums.wav",
            "--audio",
            "bass.wav",
            "--out",
            "song.bms",
            "--lane-per-input",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert {
                midi,
                audio,
                lane_per_input,
                ..
            } => {
                assert_eq!(midi.len(), 2);
                assert_eq!(audio.len(), 2);
                assert!(lane_per_input);
            }
            _ => panic!("expected convert command"),
        }
    }

    #[test]
    fn test_cli_parses_convert_overrides() {
        let cli = Cli::try_parse_from([
            "keychart",
            "convert",
            "--midi",
            "song.mid",
            "--out",
            "song.bms",
            "--bpm",
            "150",
            "--resolution",
            "192",
            "--base36",
            "--title",
            "My Song",
            "--append",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert {
                bpm,
                resolution,
                base36,
                title,
                append,
                dry_run,
                ..
            } => {
                assert_eq!(bpm, Some(150.0));
                assert_eq!(resolution, Some(192));
                assert!(base36);
                assert_eq!(title.as_deref(), Some("My Song"));
                assert!(append);
                assert!(dry_run);
            }
            _ => panic!("expected convert command"),
        }
    }

    #[test]
    fn test_cli_requires_midi_and_out() {
        assert!(Cli::try_parse_from(["keychart", "convert", "--out", "song.bms"]).is_err());
        assert!(Cli::try_parse_from(["keychart", "convert", "--midi", "song.mid"]).is_err());
    }

    #[test]
    fn test_cli_parses_inspect() {
        let cli = Cli::try_parse_from([
            "keychart", "inspect", "--chart", "song.bms", "--resolution", "48", "--base36",
        ])
        .unwrap();
        match cli.command {
            Commands::Inspect {
                chart,
                resolution,
                base36,
            } => {
                assert_eq!(chart, "song.bms");
                assert_eq!(resolution, 48);
                assert!(base36);
            }
            _ => panic!("expected inspect command"),
        }
    }
}

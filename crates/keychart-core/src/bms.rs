//! Chart document rendering, parsing, and atomic persistence.
//!
//! The text format has three sections, each opened by a literal marker line:
//!
//! ```text
//! *---------------------- HEADER FIELD
//! #TITLE Example
//! ...
//! *---------------------- WAV LIST
//! #WAV01 notes/note_01.wav
//! *---------------------- MAIN DATA FIELD
//! #00011:0001000000000000...
//! ```
//!
//! Data row addresses pack a three-digit measure and a two-digit channel;
//! the payload is `resolution` cells of two characters each, `00` meaning
//! empty. Rendering iterates ordered maps, so equal charts produce
//! byte-identical documents.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::chart::{Chart, RowKey};
use crate::config::{HeaderFields, IdBase};
use crate::error::{ChartError, ParseError};
use crate::lane::Lane;
use crate::sample::SampleId;

pub const HEADER_MARKER: &str = "*---------------------- HEADER FIELD";
pub const WAV_MARKER: &str = "*---------------------- WAV LIST";
pub const DATA_MARKER: &str = "*---------------------- MAIN DATA FIELD";

const EMPTY_CELL: &str = "00";

static WAV_LINE: OnceLock<Regex> = OnceLock::new();
static DATA_LINE: OnceLock<Regex> = OnceLock::new();

fn wav_line() -> &'static Regex {
    WAV_LINE.get_or_init(|| {
        Regex::new(r"^#WAV([0-9A-Za-z]{2})\s+(.+)$").expect("invalid regex pattern")
    })
}

fn data_line() -> &'static Regex {
    DATA_LINE
        .get_or_init(|| Regex::new(r"^#(\d{3})(\d{2}):(.*)$").expect("invalid regex pattern"))
}

fn format_bpm(bpm: f64) -> String {
    if bpm.fract() == 0.0 {
        format!("{}", bpm as i64)
    } else {
        format!("{bpm}")
    }
}

/// Renders a chart to its full text form, trailing newline included.
pub fn render(chart: &Chart) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(HEADER_MARKER.to_string());
    let h = &chart.header;
    lines.push(format!("#PLAYER {}", h.player));
    lines.push(format!("#GENRE {}", h.genre));
    lines.push(format!("#TITLE {}", h.title));
    lines.push(format!("#ARTIST {}", h.artist));
    lines.push(format!("#BPM {}", format_bpm(h.bpm)));
    lines.push(format!("#PLAYLEVEL {}", h.play_level));
    lines.push(format!("#RANK {}", h.rank));
    lines.push(format!("#LNTYPE {}", h.ln_type));

    lines.push(String::new());
    lines.push(WAV_MARKER.to_string());
    for (id, path) in &chart.samples {
        lines.push(format!("#WAV{} {}", id.render(chart.id_base), path));
    }

    lines.push(String::new());
    lines.push(DATA_MARKER.to_string());
    for (key, row) in &chart.grid {
        let mut payload = String::with_capacity(row.len() * 2);
        for cell in row {
            match cell {
                Some(id) => payload.push_str(&id.render(chart.id_base)),
                None => payload.push_str(EMPTY_CELL),
            }
        }
        lines.push(format!(
            "#{:03}{}:{}",
            key.measure,
            key.lane.render(),
            payload
        ));
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Parses a persisted chart document.
///
/// Section markers gate which line grammars apply; sample lines are also
/// accepted inside the header section, as older documents put them there.
/// Unrecognized header keys are skipped.
pub fn parse(text: &str, resolution: u32, id_base: IdBase) -> Result<Chart, ParseError> {
    #[derive(PartialEq)]
    enum Section {
        Preamble,
        Header,
        WavList,
        Data,
    }

    let mut section = Section::Preamble;
    let mut saw_data_marker = false;
    let mut header = HeaderFields::default();
    let mut samples: BTreeMap<SampleId, String> = BTreeMap::new();
    let mut grid: BTreeMap<RowKey, Vec<Option<SampleId>>> = BTreeMap::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end();
        if line.is_empty() {
            continue;
        }
        match line {
            HEADER_MARKER => {
                section = Section::Header;
                continue;
            }
            WAV_MARKER => {
                section = Section::WavList;
                continue;
            }
            DATA_MARKER => {
                section = Section::Data;
                saw_data_marker = true;
                continue;
            }
            _ => {}
        }

        match section {
            Section::Preamble => {
                return Err(ParseError::MissingSection("HEADER FIELD"));
            }
            Section::Header | Section::WavList => {
                if let Some(caps) = wav_line().captures(line) {
                    let id_text = &caps[1];
                    let id = SampleId::parse(id_text, id_base).ok_or_else(|| {
                        ParseError::BadSampleId {
                            line: line_no,
                            text: id_text.to_string(),
                        }
                    })?;
                    samples.insert(id, caps[2].to_string());
                } else if section == Section::Header {
                    parse_header_line(line, line_no, &mut header)?;
                } else {
                    return Err(ParseError::MalformedRow {
                        line: line_no,
                        text: line.to_string(),
                    });
                }
            }
            Section::Data => {
                let caps = data_line().captures(line).ok_or_else(|| {
                    ParseError::MalformedRow {
                        line: line_no,
                        text: line.to_string(),
                    }
                })?;
                let payload = &caps[3];
                if payload.len() % 2 != 0 {
                    return Err(ParseError::MalformedRow {
                        line: line_no,
                        text: line.to_string(),
                    });
                }
                let cells = payload.len() / 2;
                if cells != resolution as usize {
                    return Err(ParseError::ResolutionMismatch {
                        line: line_no,
                        cells,
                        expected: resolution as usize,
                    });
                }
                let mut row: Vec<Option<SampleId>> = Vec::with_capacity(cells);
                for i in 0..cells {
                    let cell = &payload[i * 2..i * 2 + 2];
                    if cell == EMPTY_CELL {
                        row.push(None);
                    } else {
                        let id = SampleId::parse(cell, id_base).ok_or_else(|| {
                            ParseError::BadSampleId {
                                line: line_no,
                                text: cell.to_string(),
                            }
                        })?;
                        row.push(Some(id));
                    }
                }
                // Addresses fit their fixed widths by construction.
                let measure: u32 = caps[1].parse().map_err(|_| ParseError::MalformedRow {
                    line: line_no,
                    text: line.to_string(),
                })?;
                let channel: u8 = caps[2].parse().map_err(|_| ParseError::MalformedRow {
                    line: line_no,
                    text: line.to_string(),
                })?;
                grid.insert(
                    RowKey {
                        measure,
                        lane: Lane::new(channel),
                    },
                    row,
                );
            }
        }
    }

    if !saw_data_marker {
        return Err(ParseError::MissingSection("MAIN DATA FIELD"));
    }

    let mut chart = Chart::new(header, resolution, id_base);
    chart.samples = samples;
    chart.grid = grid;
    Ok(chart)
}

fn parse_header_line(
    line: &str,
    line_no: usize,
    header: &mut HeaderFields,
) -> Result<(), ParseError> {
    let malformed = || ParseError::MalformedRow {
        line: line_no,
        text: line.to_string(),
    };
    let Some(rest) = line.strip_prefix('#') else {
        return Err(malformed());
    };
    let (key, value) = rest.split_once(' ').unwrap_or((rest, ""));
    let value = value.trim();
    match key {
        "PLAYER" => header.player = value.parse().map_err(|_| malformed())?,
        "GENRE" => header.genre = value.to_string(),
        "TITLE" => header.title = value.to_string(),
        "ARTIST" => header.artist = value.to_string(),
        "BPM" => header.bpm = value.parse().map_err(|_| malformed())?,
        "PLAYLEVEL" => header.play_level = value.parse().map_err(|_| malformed())?,
        "RANK" => header.rank = value.parse().map_err(|_| malformed())?,
        "LNTYPE" => header.ln_type = value.parse().map_err(|_| malformed())?,
        // Foreign header keys pass through unparsed.
        _ => {}
    }
    Ok(())
}

/// Loads and parses a chart document from disk.
pub fn load(path: &Path, resolution: u32, id_base: IdBase) -> Result<Chart, ChartError> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse(&text, resolution, id_base)?)
}

/// Persists a chart atomically: write to a temp file in the target
/// directory, flush, then rename over the destination.
pub fn save_atomic(chart: &Chart, path: &Path) -> Result<(), ChartError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    tmp.write_all(render(chart).as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| ChartError::Io(e.error))?;
    Ok(())
}

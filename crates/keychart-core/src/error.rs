//! Error types for chart conversion.

use thiserror::Error;

/// Fatal errors raised by a conversion run.
///
/// Per-event anomalies (unmatched off-events, lane overflows) are not errors;
/// they are counted in [`crate::report::RunReport`]. Everything here aborts
/// the run.
#[derive(Error, Debug)]
pub enum ChartError {
    /// Every identifier in the two-digit sample space has been issued.
    #[error("sample identifier space exhausted ({capacity} identifiers)")]
    SampleSpaceExhausted {
        /// Number of issuable identifiers for the active base.
        capacity: u16,
    },

    /// Configuration failed validation before the run started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An existing chart document could not be parsed for Extend mode.
    #[error("chart parse error: {0}")]
    Parse(#[from] ParseError),

    /// The audio sink failed while exporting a clip.
    #[error("clip export failed for '{name}': {reason}")]
    ClipExport { name: String, reason: String },

    /// Filesystem failure while persisting the chart document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while parsing a persisted chart document.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A required section marker line was missing.
    #[error("missing section marker: {0}")]
    MissingSection(&'static str),

    /// A line inside a recognized section did not match its grammar.
    #[error("malformed line {line}: {text:?}")]
    MalformedRow { line: usize, text: String },

    /// A sample identifier was outside the issuable range for the base.
    #[error("invalid sample identifier {text:?} on line {line}")]
    BadSampleId { line: usize, text: String },

    /// A data row payload length disagreed with the configured resolution.
    #[error("row on line {line} has {cells} cells, expected {expected}")]
    ResolutionMismatch {
        line: usize,
        cells: usize,
        expected: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ChartError::SampleSpaceExhausted { capacity: 99 };
        assert_eq!(
            err.to_string(),
            "sample identifier space exhausted (99 identifiers)"
        );

        let err = ParseError::ResolutionMismatch {
            line: 12,
            cells: 15,
            expected: 16,
        };
        assert!(err.to_string().contains("15 cells"));
    }

    #[test]
    fn test_parse_error_converts() {
        let parse = ParseError::MissingSection("MAIN DATA FIELD");
        let chart: ChartError = parse.into();
        assert!(matches!(chart, ChartError::Parse(_)));
    }
}

//! Report text parser
//!
//! The report is a mix of free-text summary blocks and CSV-like rows. Parsing is
//! best effort: rows that fail validation are dropped, never reported as errors.

use crate::error::ParseError;
use crate::sample::{Eye, Sample};
use serde::Serialize;
use tracing::{debug, trace};

/// Line opening the CSV section
pub const CSV_MARKER: &str = "--- CSV Data ---";

/// Column header, discarded wherever it appears
pub const CSV_HEADER: &str = "Frame,Eye_Type,Diameter_mm";

/// Keys a summary line must contain to be retained
const SUMMARY_KEYS: [&str; 5] = ["Eye:", "Mean:", "Std:", "Min:", "Max:"];

/// Where in the report the parser currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Before any summary or CSV marker
    Idle,
    /// After a "Processed ... frames" line
    Summary,
    /// After the CSV marker (terminal)
    Csv,
}

/// Result of parsing one report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedReport {
    /// Accepted samples, in input line order
    pub samples: Vec<Sample>,
    /// Summary lines joined with newlines
    pub summary: String,
    /// Candidate rows that were dropped
    pub rejected_rows: usize,
}

impl ParsedReport {
    /// Whether any sample survived parsing
    pub fn has_samples(&self) -> bool {
        !self.samples.is_empty()
    }
}

/// Parse a raw report into samples and summary text.
///
/// Fails only when the text is empty. Duplicate rows are kept as-is.
pub fn parse(report_text: &str) -> Result<ParsedReport, ParseError> {
    if report_text.trim().is_empty() {
        return Err(ParseError::EmptyReport);
    }

    let mut section = Section::Idle;
    let mut summary_lines: Vec<&str> = Vec::new();
    let mut samples = Vec::new();
    let mut rejected_rows = 0;

    for line in report_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if opens_summary(line) {
            summary_lines.push(line);
            if section == Section::Idle {
                section = Section::Summary;
            }
            continue;
        }

        if line == CSV_MARKER {
            section = Section::Csv;
            continue;
        }

        if line == CSV_HEADER {
            continue;
        }

        if section == Section::Summary {
            if SUMMARY_KEYS.iter().any(|key| line.contains(key)) {
                summary_lines.push(line);
            }
            continue;
        }

        if line.contains(',') {
            match parse_row(line) {
                Some(sample) => samples.push(sample),
                None => {
                    trace!("Dropping malformed row: {:?}", line);
                    rejected_rows += 1;
                }
            }
        }
    }

    debug!(
        "Parsed report: {} samples, {} rejected rows, {} summary lines",
        samples.len(),
        rejected_rows,
        summary_lines.len()
    );
    metrics::counter!("pupil_reports_parsed_total").increment(1);
    metrics::counter!("pupil_rows_rejected_total").increment(rejected_rows as u64);

    Ok(ParsedReport {
        samples,
        summary: summary_lines.join("\n"),
        rejected_rows,
    })
}

fn opens_summary(line: &str) -> bool {
    line.contains("Processed") && line.contains("frames")
}

/// `<frame>,<eye label>,<diameter>[,...]`
fn parse_row(line: &str) -> Option<Sample> {
    let mut fields = line.split(',');
    let frame = fields.next()?.trim().parse::<u32>().ok()?;
    let eye = Eye::from_label(fields.next()?.trim())?;
    let diameter_mm = fields
        .next()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())?;
    Some(Sample::new(frame, eye, diameter_mm))
}

//! Report Parsing Error Types

use thiserror::Error;

/// Errors raised while parsing a report.
///
/// Malformed data rows are never errors: they are dropped and counted in
/// [`ParsedReport::rejected_rows`](crate::ParsedReport::rejected_rows).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The report contained no text at all
    #[error("Report is empty")]
    EmptyReport,
}

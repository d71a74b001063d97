//! Assembly and service errors

use report_parser::ParseError;
use thiserror::Error;

/// Errors building a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// The report yielded no samples
    #[error("No valid pupil data found in the analysis results")]
    NoValidData,
}

/// Errors from the analysis pipeline as seen by callers
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    /// The store rejected a write; the record was discarded
    #[error("{message}: {detail}")]
    StoreWrite { message: String, detail: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

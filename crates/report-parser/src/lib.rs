//! Pupil Report Parsing
//!
//! Turns the loosely structured text returned by the pupil-diameter service
//! into typed per-frame samples plus the free-text summary block.

mod error;
mod parser;
mod sample;

pub use error::ParseError;
pub use parser::{parse, ParsedReport, CSV_HEADER, CSV_MARKER};
pub use sample::{Eye, Sample};

//! API route handlers

pub mod analyses;
pub mod trend;

//! Pupil Statistics
//!
//! Descriptive statistics (mean, population std-dev, min, max) per eye.

mod statistics;

pub use statistics::{combined_mean, population_std_dev, EyeStatistics};

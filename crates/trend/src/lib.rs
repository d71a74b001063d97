//! Trend Analysis
//!
//! Classifies the trajectory of repeated same-day measurements by comparing
//! the average pupil diameter of the earlier and later halves of the day.

mod analyzer;

pub use analyzer::{
    analyze_trend, Trend, TrendAnalysis, TrendPoint, DELTA_THRESHOLD_MM, VARIABILITY_THRESHOLD_MM,
};

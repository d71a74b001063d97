//! Trend Analyzer Implementation

use chrono::{DateTime, Utc};
use pupil_stats::population_std_dev;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Half-to-half change in mean diameter that counts as a direction (mm)
pub const DELTA_THRESHOLD_MM: f64 = 0.1;

/// Population std-dev above which a flat day is called variable (mm)
pub const VARIABILITY_THRESHOLD_MM: f64 = 0.15;

/// One measurement in a day's series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub time: DateTime<Utc>,
    pub pupil_diameter: f64,
}

/// Direction of the day's measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Fewer than two measurements
    Insufficient,
    Declining,
    Improving,
    Variable,
    Stable,
}

impl Trend {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Insufficient => "insufficient",
            Trend::Declining => "declining",
            Trend::Improving => "improving",
            Trend::Variable => "variable",
            Trend::Stable => "stable",
        }
    }

    /// Human-readable summary
    pub fn message(&self) -> &'static str {
        match self {
            Trend::Insufficient => "Not enough measurements today to determine a trend",
            Trend::Declining => {
                "Pupil size has decreased through the day, suggesting rising fatigue"
            }
            Trend::Improving => "Pupil size has increased through the day, suggesting recovery",
            Trend::Variable => "Pupil size has fluctuated noticeably today",
            Trend::Stable => "Pupil size has remained steady today",
        }
    }

    /// Get recommended action
    pub fn recommendation(&self) -> &'static str {
        match self {
            Trend::Insufficient => "Take another measurement later today to see your trend",
            Trend::Declining => "Schedule a break soon and avoid demanding tasks until you rest",
            Trend::Improving => "Keep doing what you are doing; your rest appears effective",
            Trend::Variable => "Try to keep a regular rhythm of work and short breaks",
            Trend::Stable => "Maintain your current routine",
        }
    }

    /// Chart color
    pub fn color(&self) -> &'static str {
        match self {
            Trend::Insufficient => "#9E9E9E",
            Trend::Declining => "#F44336",
            Trend::Improving => "#4CAF50",
            Trend::Variable => "#FF9800",
            Trend::Stable => "#2196F3",
        }
    }
}

/// Trend classification plus the numbers behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub trend: Trend,
    pub message: String,
    pub recommendation: String,
    pub color: String,
    /// Number of measurements considered
    pub points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_half_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_half_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variability: Option<f64>,
}

impl TrendAnalysis {
    fn new(trend: Trend, points: usize) -> Self {
        Self {
            trend,
            message: trend.message().to_string(),
            recommendation: trend.recommendation().to_string(),
            color: trend.color().to_string(),
            points,
            first_half_mean: None,
            second_half_mean: None,
            variability: None,
        }
    }
}

/// Classify a day's series of measurements.
///
/// The earliest `ceil(n/2)` points form the first half. Checks run in order:
/// declining, improving, variable, stable.
pub fn analyze_trend(series: &[TrendPoint]) -> TrendAnalysis {
    if series.len() < 2 {
        return TrendAnalysis::new(Trend::Insufficient, series.len());
    }

    let mut ordered = series.to_vec();
    ordered.sort_by_key(|p| p.time);
    let diameters: Vec<f64> = ordered.iter().map(|p| p.pupil_diameter).collect();

    let split = (diameters.len() + 1) / 2;
    let first_half_mean = mean(&diameters[..split]);
    let second_half_mean = mean(&diameters[split..]);
    let delta = second_half_mean - first_half_mean;
    let variability = population_std_dev(&diameters);

    let trend = if delta < -DELTA_THRESHOLD_MM {
        Trend::Declining
    } else if delta > DELTA_THRESHOLD_MM {
        Trend::Improving
    } else if variability > VARIABILITY_THRESHOLD_MM {
        Trend::Variable
    } else {
        Trend::Stable
    };

    debug!(
        "Trend over {} points: {} (delta {:.3}, variability {:.3})",
        diameters.len(),
        trend.as_str(),
        delta,
        variability
    );

    TrendAnalysis {
        first_half_mean: Some(first_half_mean),
        second_half_mean: Some(second_half_mean),
        variability: Some(variability),
        ..TrendAnalysis::new(trend, diameters.len())
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

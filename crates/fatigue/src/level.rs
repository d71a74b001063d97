//! Fatigue level classification

use pupil_stats::{combined_mean, EyeStatistics};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Average diameter below which fatigue is high (mm, exclusive)
pub const HIGH_FATIGUE_BELOW_MM: f64 = 2.2;

/// Average diameter above which fatigue is low (mm, exclusive)
pub const LOW_FATIGUE_ABOVE_MM: f64 = 2.6;

/// Cognitive fatigue level
///
/// Levels are independent per measurement. Trends compare pupil diameters,
/// never levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatigueLevel {
    Low,
    #[default]
    Moderate,
    High,
}

impl FatigueLevel {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FatigueLevel::Low => "low",
            FatigueLevel::Moderate => "moderate",
            FatigueLevel::High => "high",
        }
    }

    /// Get recommended action
    pub fn recommendation(&self) -> &'static str {
        match self {
            FatigueLevel::Low => "You appear alert. Keep up regular breaks to stay that way",
            FatigueLevel::Moderate => {
                "Some signs of fatigue. Consider a short break and rest your eyes"
            }
            FatigueLevel::High => {
                "Significant fatigue detected. Take a longer break before demanding tasks"
            }
        }
    }
}

impl fmt::Display for FatigueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify fatigue from per-eye statistics.
///
/// Only eyes that are present with a positive mean take part. With no eligible
/// eye the result is `Moderate`.
pub fn classify(left: Option<&EyeStatistics>, right: Option<&EyeStatistics>) -> FatigueLevel {
    let Some(avg) = combined_mean(left, right) else {
        debug!("No eye statistics available, defaulting to moderate fatigue");
        return FatigueLevel::Moderate;
    };

    if avg < HIGH_FATIGUE_BELOW_MM {
        FatigueLevel::High
    } else if avg > LOW_FATIGUE_ABOVE_MM {
        FatigueLevel::Low
    } else {
        FatigueLevel::Moderate
    }
}

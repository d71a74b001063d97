//! Derived eye metrics
//!
//! Blink counting works on real samples. Reaction time, eye-movement pattern,
//! focus accuracy, visual acuity and contrast sensitivity are not measured by
//! the pupil service yet; they are drawn from level-keyed ranges and tagged
//! [`Provenance::Simulated`].

use crate::level::FatigueLevel;
use rand::Rng;
use report_parser::Sample;
use serde::{Deserialize, Serialize};

/// Diameter drop between adjacent same-eye samples that counts as a blink (mm)
pub const BLINK_DROP_THRESHOLD_MM: f64 = 0.5;

/// Lower bound for reaction-time estimates (ms)
pub const MIN_REACTION_TIME_MS: u32 = 200;

/// Pupil size below which reaction time is penalised (mm)
const SMALL_PUPIL_MM: f64 = 2.0;
/// Pupil size above which reaction time is credited (mm)
const LARGE_PUPIL_MM: f64 = 3.0;
const SMALL_PUPIL_PENALTY_MS: f64 = 50.0;
const LARGE_PUPIL_CREDIT_MS: f64 = 25.0;

/// Where a derived value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Computed from measured samples
    Measured,
    /// Stand-in value drawn from a level-keyed range
    Simulated,
}

/// A derived metric plus its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedValue<T> {
    pub value: T,
    pub provenance: Provenance,
}

impl<T> DerivedValue<T> {
    pub fn measured(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::Measured,
        }
    }

    pub fn simulated(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::Simulated,
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.provenance == Provenance::Simulated
    }
}

/// Estimate reaction time in milliseconds.
///
/// The base range depends on the fatigue level, then small pupils add 50 ms and
/// large pupils subtract 25 ms. Never below [`MIN_REACTION_TIME_MS`].
pub fn estimate_reaction_time<R: Rng + ?Sized>(
    rng: &mut R,
    level: FatigueLevel,
    avg_pupil_mm: Option<f64>,
) -> DerivedValue<u32> {
    let (low, high) = match level {
        FatigueLevel::Low => (250.0, 300.0),
        FatigueLevel::Moderate => (300.0, 400.0),
        FatigueLevel::High => (400.0, 550.0),
    };
    let mut millis: f64 = rng.gen_range(low..high);

    if let Some(avg) = avg_pupil_mm {
        if avg < SMALL_PUPIL_MM {
            millis += SMALL_PUPIL_PENALTY_MS;
        } else if avg > LARGE_PUPIL_MM {
            millis -= LARGE_PUPIL_CREDIT_MS;
        }
    }

    let millis = (millis.round() as u32).max(MIN_REACTION_TIME_MS);
    DerivedValue::simulated(millis)
}

/// Blink count and rate over a test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlinkSummary {
    pub count: u32,
    /// Blinks per minute, one decimal
    pub rate_per_minute: f64,
}

/// Count blinks as sharp diameter drops between adjacent samples.
///
/// Pairs are adjacent in list order, not in time; pairs spanning two eyes are
/// skipped. A non-positive duration yields a rate of 0.
pub fn count_blinks(samples: &[Sample], test_duration_seconds: f64) -> BlinkSummary {
    let count = samples
        .windows(2)
        .filter(|pair| {
            pair[0].eye == pair[1].eye
                && pair[0].diameter_mm - pair[1].diameter_mm > BLINK_DROP_THRESHOLD_MM
        })
        .count() as u32;

    let rate_per_minute = if test_duration_seconds > 0.0 {
        let rate = count as f64 / test_duration_seconds * 60.0;
        (rate * 10.0).round() / 10.0
    } else {
        0.0
    };

    BlinkSummary {
        count,
        rate_per_minute,
    }
}

const LOW_FATIGUE_PATTERNS: [&str; 3] = ["smooth", "precise", "coordinated"];
const MODERATE_FATIGUE_PATTERNS: [&str; 3] =
    ["slightly irregular", "occasional drift", "mostly steady"];
const HIGH_FATIGUE_PATTERNS: [&str; 3] = ["erratic", "sluggish", "unsteady"];

/// Descriptive eye-movement label picked at random for the level
pub fn eye_movement_pattern<R: Rng + ?Sized>(
    rng: &mut R,
    level: FatigueLevel,
) -> DerivedValue<String> {
    let vocabulary = match level {
        FatigueLevel::Low => &LOW_FATIGUE_PATTERNS,
        FatigueLevel::Moderate => &MODERATE_FATIGUE_PATTERNS,
        FatigueLevel::High => &HIGH_FATIGUE_PATTERNS,
    };
    let label = vocabulary[rng.gen_range(0..vocabulary.len())];
    DerivedValue::simulated(label.to_string())
}

/// Focus accuracy percentage
pub fn estimate_focus_accuracy<R: Rng + ?Sized>(
    rng: &mut R,
    level: FatigueLevel,
) -> DerivedValue<u8> {
    let (low, high) = match level {
        FatigueLevel::Low => (90.0, 100.0),
        FatigueLevel::Moderate => (75.0, 90.0),
        FatigueLevel::High => (60.0, 75.0),
    };
    DerivedValue::simulated(draw_percent(rng, low, high))
}

/// Snellen visual acuity for the level
pub fn visual_acuity(level: FatigueLevel) -> DerivedValue<String> {
    let acuity = match level {
        FatigueLevel::Low => "20/20",
        FatigueLevel::Moderate => "20/25",
        FatigueLevel::High => "20/30",
    };
    DerivedValue::simulated(acuity.to_string())
}

/// Contrast sensitivity percentage
pub fn estimate_contrast_sensitivity<R: Rng + ?Sized>(
    rng: &mut R,
    level: FatigueLevel,
) -> DerivedValue<u8> {
    let (low, high) = match level {
        FatigueLevel::Low => (85.0, 100.0),
        FatigueLevel::Moderate => (70.0, 85.0),
        FatigueLevel::High => (55.0, 70.0),
    };
    DerivedValue::simulated(draw_percent(rng, low, high))
}

fn draw_percent<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> u8 {
    rng.gen_range(low..high).round() as u8
}

/// Metrics attached to an eye-test record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub blink_count: DerivedValue<u32>,
    pub blink_rate: DerivedValue<f64>,
    pub eye_movement_pattern: DerivedValue<String>,
    pub focus_accuracy: DerivedValue<u8>,
    pub visual_acuity: DerivedValue<String>,
    pub contrast_sensitivity: DerivedValue<u8>,
}

impl DerivedMetrics {
    /// Generate every eye-test metric for one measurement
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        level: FatigueLevel,
        samples: &[Sample],
        test_duration_seconds: f64,
    ) -> Self {
        let blinks = count_blinks(samples, test_duration_seconds);
        Self {
            blink_count: DerivedValue::measured(blinks.count),
            blink_rate: DerivedValue::measured(blinks.rate_per_minute),
            eye_movement_pattern: eye_movement_pattern(rng, level),
            focus_accuracy: estimate_focus_accuracy(rng, level),
            visual_acuity: visual_acuity(level),
            contrast_sensitivity: estimate_contrast_sensitivity(rng, level),
        }
    }
}

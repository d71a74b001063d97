//! Cognitive Fatigue Scoring
//!
//! - Three-level fatigue classification from average pupil diameter
//! - Derived metrics: reaction time, blinks, eye-movement pattern, focus
//!   accuracy, visual acuity, contrast sensitivity
//!
//! Several derived metrics are simulated stand-ins until the upstream service
//! measures them. Each carries a [`Provenance`] tag saying so.

pub mod derived;
pub mod level;

pub use derived::{
    count_blinks, estimate_contrast_sensitivity, estimate_focus_accuracy,
    estimate_reaction_time, eye_movement_pattern, visual_acuity, BlinkSummary, DerivedMetrics,
    DerivedValue, Provenance, BLINK_DROP_THRESHOLD_MM, MIN_REACTION_TIME_MS,
};
pub use level::{classify, FatigueLevel, HIGH_FATIGUE_BELOW_MM, LOW_FATIGUE_ABOVE_MM};

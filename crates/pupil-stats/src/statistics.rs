//! Per-eye Statistics Computation

use report_parser::{Eye, Sample};
use serde::{Deserialize, Serialize};

/// Descriptive statistics for one eye within one report
///
/// All fields are exactly zero when computed over an empty set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeStatistics {
    /// Mean diameter (mm)
    pub mean: f64,
    /// Population standard deviation (mm)
    pub std_dev: f64,
    /// Minimum diameter (mm)
    pub min: f64,
    /// Maximum diameter (mm)
    pub max: f64,
}

impl EyeStatistics {
    /// Compute statistics from a slice of diameters
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        // Population variance: divide by N
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Self {
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        }
    }

    /// Compute statistics over the samples of one eye
    pub fn for_eye(samples: &[Sample], eye: Eye) -> Self {
        let values: Vec<f64> = samples
            .iter()
            .filter(|s| s.eye == eye)
            .map(|s| s.diameter_mm)
            .collect();
        Self::compute(&values)
    }

    /// Whether these statistics came from at least one sample.
    ///
    /// Diameters are positive, so a zero mean only occurs for an empty set.
    pub fn has_data(&self) -> bool {
        self.mean != 0.0
    }
}

/// Average of the per-eye means that are present and positive.
///
/// Returns `None` when neither eye qualifies.
pub fn combined_mean(left: Option<&EyeStatistics>, right: Option<&EyeStatistics>) -> Option<f64> {
    let eligible: Vec<f64> = [left, right]
        .into_iter()
        .flatten()
        .map(|s| s.mean)
        .filter(|&m| m > 0.0)
        .collect();

    if eligible.is_empty() {
        None
    } else {
        Some(eligible.iter().sum::<f64>() / eligible.len() as f64)
    }
}

/// Population standard deviation of a series (0 for an empty series)
pub fn population_std_dev(values: &[f64]) -> f64 {
    EyeStatistics::compute(values).std_dev
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn samples(eye: Eye, values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &d)| Sample::new(i as u32, eye, d))
            .collect()
    }

    #[test]
    fn test_population_std_dev() {
        let data = samples(Eye::Left, &[2.0, 2.0, 4.0, 4.0]);
        let stats = EyeStatistics::for_eye(&data, Eye::Left);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.std_dev, 1.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 4.0);
    }

    #[test]
    fn test_empty_eye_is_zero_filled() {
        let data = samples(Eye::Right, &[2.4, 2.5]);
        let stats = EyeStatistics::for_eye(&data, Eye::Left);
        assert_eq!(
            stats,
            EyeStatistics {
                mean: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0
            }
        );
        assert!(!stats.has_data());
    }

    #[test]
    fn test_filters_by_eye() {
        let mut data = samples(Eye::Left, &[2.0, 3.0]);
        data.extend(samples(Eye::Right, &[10.0]));
        let stats = EyeStatistics::for_eye(&data, Eye::Left);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.max, 3.0);
    }

    #[test]
    fn test_combined_mean_skips_missing_and_zero() {
        let left = EyeStatistics::compute(&[2.0]);
        let right = EyeStatistics::compute(&[3.0]);
        let empty = EyeStatistics::default();

        assert_eq!(combined_mean(Some(&left), Some(&right)), Some(2.5));
        assert_eq!(combined_mean(Some(&left), None), Some(2.0));
        assert_eq!(combined_mean(Some(&empty), Some(&right)), Some(3.0));
        assert_eq!(combined_mean(None, None), None);
        assert_eq!(combined_mean(Some(&empty), None), None);
    }

    #[test]
    fn test_serialized_field_names() {
        let stats = EyeStatistics::compute(&[2.0, 4.0]);
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["stdDev"], 1.0);
        assert_eq!(json["mean"], 3.0);
    }

    proptest! {
        #[test]
        fn prop_min_mean_max_ordered(values in prop::collection::vec(1.5f64..4.0, 1..100)) {
            let stats = EyeStatistics::compute(&values);
            prop_assert!(stats.min <= stats.mean + 1e-12);
            prop_assert!(stats.mean <= stats.max + 1e-12);
            prop_assert!(stats.std_dev >= 0.0);
            prop_assert!(stats.has_data());
        }
    }
}

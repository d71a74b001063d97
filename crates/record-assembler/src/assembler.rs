//! Record Assembler Implementation

use crate::error::AssemblyError;
use crate::record::{AnalysisRecord, EyeTestRecord};
use crate::settings::Settings;
use chrono::{DateTime, Local};
use fatigue::{classify, estimate_reaction_time, DerivedMetrics};
use pupil_stats::{combined_mean, EyeStatistics};
use rand::Rng;
use report_parser::{Eye, ParsedReport};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Assembler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Eye-test duration used for the blink rate (seconds)
    pub test_duration_seconds: f64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            test_duration_seconds: 30.0,
        }
    }
}

/// Pass-through parameters of one analysis request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub analysis_url: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Builds records from parsed reports
#[derive(Debug, Clone, Default)]
pub struct RecordAssembler {
    config: AssemblerConfig,
}

impl RecordAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    /// Assemble an analysis record stamped with the current local time
    pub fn assemble<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        report: &ParsedReport,
        request: &AnalysisRequest,
    ) -> Result<AnalysisRecord, AssemblyError> {
        self.assemble_at(rng, report, request, Local::now())
    }

    /// Assemble an analysis record as of `now`
    pub fn assemble_at<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        report: &ParsedReport,
        request: &AnalysisRequest,
        now: DateTime<Local>,
    ) -> Result<AnalysisRecord, AssemblyError> {
        let samples = &report.samples;
        let frame_count = samples
            .iter()
            .map(|s| u64::from(s.frame))
            .max()
            .ok_or(AssemblyError::NoValidData)?
            + 1;

        let left_eye_stats =
            Some(EyeStatistics::for_eye(samples, Eye::Left)).filter(EyeStatistics::has_data);
        let right_eye_stats =
            Some(EyeStatistics::for_eye(samples, Eye::Right)).filter(EyeStatistics::has_data);

        let fatigue_level = classify(left_eye_stats.as_ref(), right_eye_stats.as_ref());
        let average = combined_mean(left_eye_stats.as_ref(), right_eye_stats.as_ref());
        let reaction_time = estimate_reaction_time(rng, fatigue_level, average);

        debug!(
            "Assembled record: {} samples, {} frames, fatigue {}",
            samples.len(),
            frame_count,
            fatigue_level
        );

        Ok(AnalysisRecord {
            id: now.timestamp_millis().to_string(),
            timestamp: None,
            date: now.date_naive(),
            left_eye_stats,
            right_eye_stats,
            summary: report.summary.clone(),
            fatigue_level,
            pupil_data: samples.clone(),
            frame_count,
            reaction_time,
            settings: request.settings.clone(),
            analysis_url: request.analysis_url.clone(),
            metadata: request.metadata.clone(),
        })
    }

    /// Extend an analysis record into an eye-test record
    pub fn assemble_eye_test<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        analysis: AnalysisRecord,
    ) -> EyeTestRecord {
        let metrics = DerivedMetrics::generate(
            rng,
            analysis.fatigue_level,
            &analysis.pupil_data,
            self.config.test_duration_seconds,
        );
        EyeTestRecord {
            analysis,
            metrics,
            test_duration_seconds: self.config.test_duration_seconds,
        }
    }
}

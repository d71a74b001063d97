//! Persisted record types

use crate::context::RecordKind;
use crate::settings::Settings;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fatigue::{DerivedMetrics, DerivedValue, FatigueLevel};
use pupil_stats::{combined_mean, EyeStatistics};
use report_parser::Sample;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use trend::TrendPoint;

/// General analysis record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    /// Client epoch milliseconds at save time
    pub id: String,
    /// Server write time, known only once read back from the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Client local date at save time
    pub date: NaiveDate,
    /// Omitted when the left eye had no samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_eye_stats: Option<EyeStatistics>,
    /// Omitted when the right eye had no samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_eye_stats: Option<EyeStatistics>,
    pub summary: String,
    pub fatigue_level: FatigueLevel,
    pub pupil_data: Vec<Sample>,
    /// `max(frame) + 1`, not the sample count
    pub frame_count: u64,
    pub reaction_time: DerivedValue<u32>,
    pub settings: Settings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AnalysisRecord {
    /// Average of the eyes with data
    pub fn average_pupil_size(&self) -> Option<f64> {
        combined_mean(self.left_eye_stats.as_ref(), self.right_eye_stats.as_ref())
    }

    /// Best known measurement time: server timestamp, else the id's epoch millis
    pub fn measured_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.or_else(|| {
            self.id
                .parse::<i64>()
                .ok()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        })
    }

    /// Point for the day's trend series
    pub fn trend_point(&self) -> Option<TrendPoint> {
        Some(TrendPoint {
            time: self.measured_at()?,
            pupil_diameter: self.average_pupil_size()?,
        })
    }
}

/// Eye-test record: the analysis record plus derived metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeTestRecord {
    #[serde(flatten)]
    pub analysis: AnalysisRecord,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    pub test_duration_seconds: f64,
}

/// A record type stored in its own collection
pub trait PersistedRecord: Serialize + DeserializeOwned + Send + 'static {
    const KIND: RecordKind;

    /// Shared analysis fields
    fn analysis(&self) -> &AnalysisRecord;

    /// Attach the server write time after reading back
    fn stamp(&mut self, timestamp: DateTime<Utc>);
}

impl PersistedRecord for AnalysisRecord {
    const KIND: RecordKind = RecordKind::Analysis;

    fn analysis(&self) -> &AnalysisRecord {
        self
    }

    fn stamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = Some(timestamp);
    }
}

impl PersistedRecord for EyeTestRecord {
    const KIND: RecordKind = RecordKind::EyeTest;

    fn analysis(&self) -> &AnalysisRecord {
        &self.analysis
    }

    fn stamp(&mut self, timestamp: DateTime<Utc>) {
        self.analysis.timestamp = Some(timestamp);
    }
}

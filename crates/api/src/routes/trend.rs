//! Trend Routes

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Local, NaiveDate};
use record_assembler::{AnalysisRecord, EyeTestRecord, RecordKind};
use serde::Deserialize;
use std::sync::Arc;
use trend::TrendAnalysis;

use crate::AppState;

/// Query parameters for the trend endpoint
#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    /// Day to analyse (defaults to today, local time)
    pub date: Option<NaiveDate>,
    /// Collection to read (defaults to eye tests)
    pub kind: Option<RecordKind>,
}

/// Get the trend for one day
pub async fn get_trend(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendQuery>,
) -> Json<TrendAnalysis> {
    let date = params.date.unwrap_or_else(|| Local::now().date_naive());

    let analysis = match params.kind.unwrap_or(RecordKind::EyeTest) {
        RecordKind::Analysis => state.service.daily_trend::<AnalysisRecord>(date).await,
        RecordKind::EyeTest => state.service.daily_trend::<EyeTestRecord>(date).await,
    };

    Json(analysis)
}

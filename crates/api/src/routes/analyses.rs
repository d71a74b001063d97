//! Analysis Routes

use axum::{extract::State, http::StatusCode, Json};
use record_assembler::{AnalysisRecord, AnalysisRequest, EyeTestRecord, SavedAnalysis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// Body of a report submission
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// Raw report text from the pupil service
    pub report: String,
    #[serde(flatten)]
    pub request: AnalysisRequest,
}

/// Response for list endpoints
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub count: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

/// Parse, score and persist a report
pub async fn submit_analysis(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SavedAnalysis>), ApiError> {
    let saved = state.service.submit_report(&body.report, body.request).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// List general analysis records
pub async fn list_analyses(
    State(state): State<Arc<AppState>>,
) -> Json<ListResponse<AnalysisRecord>> {
    Json(state.service.history::<AnalysisRecord>().await.into())
}

/// List eye-test records
pub async fn list_eye_tests(
    State(state): State<Arc<AppState>>,
) -> Json<ListResponse<EyeTestRecord>> {
    Json(state.service.history::<EyeTestRecord>().await.into())
}

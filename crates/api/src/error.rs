//! API error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use record_assembler::ServiceError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Service(ServiceError::Parse(e)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: e.to_string(),
                    detail: None,
                },
            ),
            ApiError::Service(ServiceError::Assembly(e)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: e.to_string(),
                    detail: None,
                },
            ),
            ApiError::Service(ServiceError::StoreWrite { message, detail }) => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    error: message,
                    detail: Some(detail),
                },
            ),
            ApiError::Service(ServiceError::Serialization(detail)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Failed to encode record".to_string(),
                    detail: Some(detail),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

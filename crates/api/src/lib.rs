//! Pupil Fatigue API Server
//!
//! HTTP backend for submitting pupil-diameter reports and reading back the
//! stored analyses, eye tests and daily trends.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use record_assembler::{AnalysisService, AssemblerConfig, Identity, RecordAssembler, RecordKind};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use storage::MemoryStore;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use config::{LogConfig, LogFormat, ServerConfig};
pub use error::ApiError;
pub use rate_limit::{create_governor_config, RateLimitConfig};

/// Application state shared across handlers
pub struct AppState {
    /// Analysis pipeline bound to the in-memory store
    pub service: AnalysisService<MemoryStore>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: &ServerConfig, metrics: Option<PrometheusHandle>) -> Self {
        let assembler = RecordAssembler::new(AssemblerConfig {
            test_duration_seconds: config.test_duration_seconds,
        });
        let service = AnalysisService::new(
            Arc::new(MemoryStore::new()),
            Identity::anonymous(config.user_id.clone()),
            assembler,
        );

        Self {
            service,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics,
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub version: String,
    pub uptime_seconds: u64,
    pub user_id: String,
    pub counts: RecordCounts,
}

/// Stored record counts for the current identity
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCounts {
    pub analyses: usize,
    pub eye_tests: usize,
}

/// Create the application router
///
/// Only report submission is rate limited.
pub fn create_router(state: Arc<AppState>, rate_limit: &RateLimitConfig) -> Router {
    let mut submit =
        Router::new().route("/api/v1/analyses", post(routes::analyses::submit_analysis));
    match create_governor_config(rate_limit) {
        Some(config) => submit = submit.route_layer(GovernorLayer { config }),
        None => warn!("Invalid rate limit settings, submissions are not limited"),
    }

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/analyses", get(routes::analyses::list_analyses))
        .route("/api/v1/eye-tests", get(routes::analyses::list_eye_tests))
        .route("/api/v1/trend", get(routes::trend::get_trend))
        .route("/metrics", get(metrics_handler))
        .merge(submit)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let service = &state.service;
    let store = service.store();

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        user_id: service.identity().uid.clone(),
        counts: RecordCounts {
            analyses: store.document_count(&service.collection_path(RecordKind::Analysis)),
            eye_tests: store.document_count(&service.collection_path(RecordKind::EyeTest)),
        },
    };

    Json(response)
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// Initialize logging
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already set: {e}");
    }
}

/// Run the server
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus recorder unavailable: {}", e);
            None
        }
    };

    let state = Arc::new(AppState::new(&config, metrics));
    let app = create_router(state, &config.rate_limit);

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::ConnectInfo;
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const REPORT: &str = "\
Processed 6 frames from upload.mp4
Left Eye:
  Mean: 2.30 mm
  Std: 0.05 mm
--- CSV Data ---
Frame,Eye_Type,Diameter_mm
0,left_eye,2.25
1,left_eye,2.30
2,left_eye,2.35
0,right_eye,2.24
1,right_eye,2.28
2,right_eye,2.32
";

    fn test_config() -> ServerConfig {
        ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            user_id: "tester".to_string(),
            test_duration_seconds: 30.0,
            log: LogConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
            rate_limit: RateLimitConfig {
                per_second: 1,
                burst_size: 50,
            },
        }
    }

    fn test_app(rate_limit: &RateLimitConfig) -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(&test_config(), None));
        (create_router(state.clone(), rate_limit), state)
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let mut req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        req
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app(&test_config().rate_limit);
        let response = app
            .oneshot(request(Method::GET, "/api/v1/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["userId"], "tester");
        assert_eq!(body["counts"]["analyses"], 0);
    }

    #[tokio::test]
    async fn test_submit_and_list() {
        let (app, state) = test_app(&test_config().rate_limit);

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/analyses",
                Some(json!({
                    "report": REPORT,
                    "settings": {
                        "pupilSelection": "both",
                        "tvModel": "ResNet18",
                        "blinkDetection": true
                    },
                    "analysisUrl": "https://example.org/result"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        assert_eq!(body["analysis"]["fatigueLevel"], "moderate");
        assert_eq!(body["analysis"]["frameCount"], 3);
        assert_eq!(body["analysis"]["analysisUrl"], "https://example.org/result");
        assert_eq!(body["eyeTest"]["visualAcuity"]["value"], "20/25");

        let service = &state.service;
        assert_eq!(
            service
                .store()
                .document_count(&service.collection_path(RecordKind::EyeTest)),
            1
        );

        let response = app
            .oneshot(request(Method::GET, "/api/v1/analyses", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["fatigueLevel"], "moderate");
    }

    #[tokio::test]
    async fn test_submit_without_samples_is_unprocessable() {
        let (app, _) = test_app(&test_config().rate_limit);

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/analyses",
                Some(json!({ "report": "Processed 0 frames\n--- CSV Data ---\n" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(
            body["error"],
            "No valid pupil data found in the analysis results"
        );

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/v1/analyses",
                Some(json!({ "report": "   \n" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_store_failure_is_bad_gateway() {
        let (app, state) = test_app(&test_config().rate_limit);
        state.service.store().set_fail_writes(true);

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/v1/analyses",
                Some(json!({ "report": REPORT })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Failed to save analysis results");
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_trend_defaults_to_insufficient() {
        let (app, _) = test_app(&test_config().rate_limit);
        let response = app
            .oneshot(request(Method::GET, "/api/v1/trend?kind=analysis", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["trend"], "insufficient");
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let (app, _) = test_app(&test_config().rate_limit);
        let response = app
            .oneshot(request(Method::GET, "/metrics", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_submission_is_rate_limited() {
        let (app, _) = test_app(&RateLimitConfig {
            per_second: 60,
            burst_size: 1,
        });

        let first = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/analyses",
                Some(json!({ "report": REPORT })),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/analyses",
                Some(json!({ "report": REPORT })),
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        // Reads are not limited
        let read = app
            .oneshot(request(Method::GET, "/api/v1/eye-tests", None))
            .await
            .unwrap();
        assert_eq!(read.status(), StatusCode::OK);
    }
}

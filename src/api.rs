//! HTTP surface for the detection engine.
//!
//! `POST /analyze` takes a multipart form with a `file` field holding the
//! CSV batch and returns the full analysis report. `GET /health` is a
//! liveness probe. Malformed input comes back as 4xx with a
//! `{"detail": ...}` body; detector timeouts and caps are not errors.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::core::pipeline::run_analysis;
use crate::core::AnalysisReport;
use crate::error::AnalyzeError;
use crate::ingest;

/// Shared state for the axum application.
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
}

/// Build the router with CORS and request tracing, mirroring the permissive
/// setup the visualisation front end expects.
pub fn create_router(state: ApiState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;
    Router::new()
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn analyze(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisReport>, ApiError> {
    let limit = state.config.server.max_upload_bytes;

    let mut file_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() == Some("file") {
            let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
            file_bytes = Some(bytes);
            break;
        }
    }
    let bytes = file_bytes.ok_or(ApiError(AnalyzeError::MissingFile))?;
    if bytes.len() > limit {
        return Err(ApiError(AnalyzeError::TooLarge { limit }));
    }

    let config = Arc::clone(&state.config);
    let report = tokio::task::spawn_blocking(move || {
        let records = ingest::parse_csv(&bytes)?;
        run_analysis(records, &config)
    })
    .await
    .map_err(|_| ApiError(AnalyzeError::Invariant("analysis task aborted".into())))??;

    Ok(Json(report))
}

fn multipart_error(e: axum::extract::multipart::MultipartError, limit: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError(AnalyzeError::TooLarge { limit })
    } else {
        ApiError(AnalyzeError::Csv(format!("multipart read failed: {e}")))
    }
}

/// Wrapper mapping [`AnalyzeError`] categories onto HTTP statuses.
pub struct ApiError(pub AnalyzeError);

impl From<AnalyzeError> for ApiError {
    fn from(e: AnalyzeError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AnalyzeError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AnalyzeError::Invariant(_) | AnalyzeError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed with internal error");
        }
        (status, Json(json!({"detail": self.0.to_string()}))).into_response()
    }
}

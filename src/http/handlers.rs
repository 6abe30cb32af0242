//! Route handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use super::ApiError;
use crate::engine::Orchestrator;
use crate::error::Error;
use crate::model::{AnalysisReport, CreateAnalysisRequest};

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

/// GET /healthz
pub(crate) async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// POST /api/v1/events/{event_id}/ai-analysis
///
/// An empty body means no event context.
pub(crate) async fn handle_create_analysis(
    State(orchestrator): State<Orchestrator>,
    Path(event_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request = parse_request(&body)?;
    let report = orchestrator.create_report(&event_id, request)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "report_id": report.report_id,
            "status": report.status,
        })),
    ))
}

/// GET /api/v1/ai/analysis-reports/{report_id}
pub(crate) async fn handle_get_report(
    State(orchestrator): State<Orchestrator>,
    Path(report_id): Path<String>,
) -> Result<Json<AnalysisReport>, ApiError> {
    Ok(Json(orchestrator.get_report(&report_id)?))
}

/// GET /api/v1/ai/analysis-reports/ with an empty id segment.
pub(crate) async fn handle_missing_report_id() -> ApiError {
    ApiError(Error::ReportIdRequired)
}

fn parse_request(body: &[u8]) -> Result<CreateAnalysisRequest, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreateAnalysisRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| Error::InvalidRequest(format!("malformed request body: {e}")))
}

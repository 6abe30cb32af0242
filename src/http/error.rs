//! Mapping from engine errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::Error;

/// An engine error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::EventIdRequired | Error::ReportIdRequired | Error::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self.0 {
            Error::AlreadyExists(existing) => json!({
                "error": "analysis report already exists for this event",
                "report_id": existing.report_id,
                "status": existing.status,
            }),
            Error::NotFound(_) => json!({ "error": "analysis report not found" }),
            err if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE => {
                tracing::error!(error = %err, "request failed");
                json!({ "error": "internal server error" })
            }
            err => json!({ "error": err.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnalysisReport;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (Error::EventIdRequired, StatusCode::BAD_REQUEST),
            (Error::ReportIdRequired, StatusCode::BAD_REQUEST),
            (Error::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                Error::AlreadyExists(Box::new(AnalysisReport::pending("e", chrono::Utc::now()))),
                StatusCode::CONFLICT,
            ),
            (Error::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (Error::Other("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, want) in cases {
            assert_eq!(ApiError(err).status(), want);
        }
    }
}

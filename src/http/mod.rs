//! HTTP boundary: translates requests into orchestrator calls.
//!
//! Routes:
//! - `POST /api/v1/events/{event_id}/ai-analysis`
//! - `GET  /api/v1/ai/analysis-reports/{report_id}`
//! - `GET  /healthz`

mod error;
mod handlers;

pub use error::ApiError;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;

use crate::engine::Orchestrator;
use crate::error::Result;

use handlers::{
    handle_create_analysis, handle_get_report, handle_health, handle_missing_report_id,
    handle_not_found,
};

/// Maximum request body size: 1 MiB.
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Build the service router around an orchestrator.
pub fn router(orchestrator: Orchestrator) -> Router {
    Router::new()
        .route("/healthz", get(handle_health))
        .route(
            "/api/v1/events/{event_id}/ai-analysis",
            post(handle_create_analysis),
        )
        .route(
            "/api/v1/ai/analysis-reports/{report_id}",
            get(handle_get_report),
        )
        .route("/api/v1/ai/analysis-reports/", get(handle_missing_report_id))
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(orchestrator)
}

/// Serve until `shutdown` resolves, then finish in-flight requests.
///
/// Background analysis jobs are not drained here; see
/// [`Orchestrator::shutdown`].
pub async fn serve(
    listener: TcpListener,
    orchestrator: Orchestrator,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "ai-engine listening");
    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("http server stopped");
    Ok(())
}

//! Error types for ai-engine.

use std::time::Duration;

use thiserror::Error;

use crate::model::{AnalysisReport, ReportStatus};

#[derive(Debug, Error)]
pub enum Error {
    #[error("event id is required")]
    EventIdRequired,

    #[error("report id is required")]
    ReportIdRequired,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("analysis report not found: {0}")]
    NotFound(String),

    /// Carries a copy of the record that already owns the id or event.
    #[error(
        "analysis report already exists for event {} (report {})",
        .0.event_id,
        .0.report_id
    )]
    AlreadyExists(Box<AnalysisReport>),

    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: ReportStatus,
        to: ReportStatus,
    },

    #[error("report identity fields are immutable")]
    IdentityChanged,

    #[error("report generator unavailable: {0}")]
    Unavailable(String),

    #[error("report generation failed: {0}")]
    Generation(String),

    #[error("report generation timed out after {}s", .0.as_secs_f64())]
    GenerationTimeout(Duration),

    #[error("report generation cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("telemetry error: {0}")]
    Telemetry(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The existing record behind an `AlreadyExists` conflict.
    pub fn existing_report(&self) -> Option<&AnalysisReport> {
        match self {
            Error::AlreadyExists(existing) => Some(existing),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

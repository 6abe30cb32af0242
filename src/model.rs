//! Core data model.
//!
//! An analysis report is one event-analysis job: identity (report id + event
//! id), lifecycle state, and, once finished, either a generated payload or a
//! failure message. [`GeneratedReport`] is the generator's output shape and
//! carries no identity or lifecycle of its own.

mod generated;
mod report;

pub use generated::*;
pub use report::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Report ID
// ---------------------------------------------------------------------------

/// Newtype for report IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub Uuid);

impl ReportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReportId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of an analysis report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// Accepted, waiting for the background worker.
    Pending,
    /// Worker is generating the analysis.
    Running,
    /// Analysis generated. Terminal.
    Success,
    /// Generation failed, timed out or was cancelled. Terminal.
    Failed,
}

impl ReportStatus {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, to),
            (Pending, Running) | (Running, Success) | (Running, Failed)
        )
    }

    /// Is this a terminal state?
    pub fn is_terminal(self) -> bool {
        matches!(self, ReportStatus::Success | ReportStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Running => "RUNNING",
            ReportStatus::Success => "SUCCESS",
            ReportStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ReportStatus::Pending),
            "RUNNING" => Ok(ReportStatus::Running),
            "SUCCESS" => Ok(ReportStatus::Success),
            "FAILED" => Ok(ReportStatus::Failed),
            other => Err(format!("unknown report status: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of a request to analyse an event. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAnalysisRequest {
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub event_context: serde_json::Map<String, serde_json::Value>,
}

impl CreateAnalysisRequest {
    pub fn with_context(event_context: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { event_context }
    }
}

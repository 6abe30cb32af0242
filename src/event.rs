//! Structured events emitted by the orchestrator on every lifecycle step.
//!
//! Events are the orchestrator's voice; report-scoped logs are the worker's
//! voice. Sinks receive events synchronously and must not block.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ReportId, ReportStatus};

/// A structured lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEvent {
    /// When this event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub kind: EventKind,
}

impl ReportEvent {
    pub fn now(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    ReportCreated {
        report_id: ReportId,
        event_id: String,
    },
    ReportDuplicate {
        event_id: String,
        existing_id: ReportId,
        existing_status: ReportStatus,
    },
    ReportRunning {
        report_id: ReportId,
        generator: String,
    },
    ReportSucceeded {
        report_id: ReportId,
        duration_ms: u64,
    },
    ReportFailed {
        report_id: ReportId,
        error: String,
        duration_ms: u64,
    },
    /// A background store write failed; the report stays where it was.
    UpdateFailed {
        report_id: ReportId,
        target: ReportStatus,
        error: String,
    },
}

/// Receiver of lifecycle events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ReportEvent);
}

/// Writes every event to the tracing pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ReportEvent) {
        match &event.kind {
            EventKind::ReportCreated {
                report_id,
                event_id,
            } => tracing::info!(%report_id, %event_id, "report created"),
            EventKind::ReportDuplicate {
                event_id,
                existing_id,
                existing_status,
            } => tracing::info!(
                %event_id,
                %existing_id,
                %existing_status,
                "duplicate analysis request"
            ),
            EventKind::ReportRunning {
                report_id,
                generator,
            } => tracing::debug!(%report_id, %generator, "report running"),
            EventKind::ReportSucceeded {
                report_id,
                duration_ms,
            } => tracing::info!(%report_id, duration_ms, "report succeeded"),
            EventKind::ReportFailed {
                report_id,
                error,
                duration_ms,
            } => tracing::warn!(%report_id, %error, duration_ms, "report failed"),
            EventKind::UpdateFailed {
                report_id,
                target,
                error,
            } => tracing::error!(%report_id, %target, %error, "report update failed"),
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: ReportEvent) {}
}

/// Keeps events in memory for inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far, oldest first.
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: ReportEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }
}

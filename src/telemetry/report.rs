//! Report lifecycle span helpers.

use tracing::Span;

use crate::model::{ReportId, ReportStatus};

/// Start the span that wraps one background analysis job.
///
/// `report.status` is declared empty and is kept current by
/// [`record_state_transition`].
pub fn start_report_span(report_id: &ReportId, event_id: &str, generator: &str) -> Span {
    tracing::info_span!(
        "report.analyze",
        "report.id" = %report_id,
        "report.event_id" = event_id,
        "report.generator" = generator,
        "report.status" = tracing::field::Empty,
    )
}

/// Record a state transition on the span and in the transition counter.
pub fn record_state_transition(span: &Span, from: ReportStatus, to: ReportStatus) {
    span.record("report.status", to.as_str());
    span.in_scope(|| {
        tracing::info!(from = from.as_str(), to = to.as_str(), "state_transition");
    });
    super::metrics::report_state_transitions().add(
        1,
        &[
            opentelemetry::KeyValue::new("from", from.as_str()),
            opentelemetry::KeyValue::new("to", to.as_str()),
        ],
    );
}

//! Background unit: drives one report from PENDING to a terminal state.

use chrono::Utc;
use opentelemetry::KeyValue;
use tokio::time::Instant;
use tracing::{Instrument, Span, error};

use super::Orchestrator;
use crate::error::Error;
use crate::event::{EventKind, ReportEvent};
use crate::generator::{GenerationContext, GenerationInput};
use crate::model::{AnalysisReport, ReportId, ReportStatus};
use crate::telemetry::metrics;
use crate::telemetry::report::{record_state_transition, start_report_span};

/// Everything a background unit needs about its report.
pub(super) struct Job {
    pub report_id: ReportId,
    pub event_id: String,
    pub event_context: serde_json::Map<String, serde_json::Value>,
}

impl Orchestrator {
    pub(super) async fn run_analysis(self, job: Job) {
        let span = start_report_span(&job.report_id, &job.event_id, self.generator.name());
        self.drive(job, span.clone()).instrument(span).await;
    }

    async fn drive(&self, job: Job, span: Span) {
        let report_id = job.report_id;

        if let Err(e) = self.store.update(
            report_id,
            Box::new(|r: &mut AnalysisReport| r.mark_running(Utc::now())),
        ) {
            self.update_failed(report_id, ReportStatus::Running, &e);
            return;
        }
        record_state_transition(&span, ReportStatus::Pending, ReportStatus::Running);
        self.events.emit(ReportEvent::now(EventKind::ReportRunning {
            report_id,
            generator: self.generator.name().to_string(),
        }));

        let started = Instant::now();
        let ctx = GenerationContext::new(self.config.processing_timeout, self.cancel.subscribe());
        let input = GenerationInput {
            event_id: job.event_id,
            event_context: job.event_context,
        };

        // The race bounds generators that ignore their context.
        let outcome = tokio::select! {
            result = self.generator.generate(&ctx, input) => result,
            reason = ctx.done() => Err(reason),
        };
        let elapsed = started.elapsed();
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        let label = if outcome.is_ok() { "success" } else { "failed" };
        metrics::generation_duration_ms().record(
            elapsed.as_secs_f64() * 1000.0,
            &[
                KeyValue::new("generator", self.generator.name().to_string()),
                KeyValue::new("outcome", label),
            ],
        );

        match outcome {
            Ok(generated) => {
                let committed = self.store.update(
                    report_id,
                    Box::new(move |r: &mut AnalysisReport| r.complete_with(generated, Utc::now())),
                );
                if let Err(e) = committed {
                    self.update_failed(report_id, ReportStatus::Success, &e);
                    return;
                }
                record_state_transition(&span, ReportStatus::Running, ReportStatus::Success);
                self.events.emit(ReportEvent::now(EventKind::ReportSucceeded {
                    report_id,
                    duration_ms,
                }));
            }
            Err(cause) => {
                let message = cause.to_string();
                let stored = message.clone();
                let committed = self.store.update(
                    report_id,
                    Box::new(move |r: &mut AnalysisReport| r.fail_with(stored, Utc::now())),
                );
                if let Err(e) = committed {
                    self.update_failed(report_id, ReportStatus::Failed, &e);
                    return;
                }
                record_state_transition(&span, ReportStatus::Running, ReportStatus::Failed);
                self.events.emit(ReportEvent::now(EventKind::ReportFailed {
                    report_id,
                    error: message,
                    duration_ms,
                }));
            }
        }
    }

    /// The unit stops here; the report keeps whatever state it last had.
    fn update_failed(&self, report_id: ReportId, target: ReportStatus, err: &Error) {
        error!(%report_id, %target, error = %err, "failed to persist report update");
        metrics::store_update_failures()
            .add(1, &[KeyValue::new("target", target.as_str())]);
        self.events.emit(ReportEvent::now(EventKind::UpdateFailed {
            report_id,
            target,
            error: err.to_string(),
        }));
    }
}

//! Analysis orchestrator: admission, dedup, background generation, reads.
//!
//! `create_report` persists a PENDING record and hands the job to a detached
//! task; the task alone drives the record to SUCCESS or FAILED. Results only
//! flow back through the store, so readers poll with `get_report`.

mod tracker;
mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use opentelemetry::KeyValue;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::DEFAULT_PROCESSING_TIMEOUT;
use crate::error::{Error, Result};
use crate::event::{EventKind, EventSink, ReportEvent, TracingSink};
use crate::generator::ReportGenerator;
use crate::model::{AnalysisReport, CreateAnalysisRequest, ReportId};
use crate::store::ReportStore;
use crate::telemetry::metrics;

use tracker::InFlight;
use worker::Job;

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on one generator call. Zero means the default.
    pub processing_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            processing_timeout: DEFAULT_PROCESSING_TIMEOUT,
        }
    }
}

/// Accepts analysis requests and runs them in the background.
///
/// Cloning is cheap; clones share the store, generator, sink and in-flight
/// accounting.
pub struct Orchestrator {
    store: Arc<dyn ReportStore>,
    generator: Arc<dyn ReportGenerator>,
    events: Arc<dyn EventSink>,
    config: OrchestratorConfig,
    in_flight: InFlight,
    closing: Arc<AtomicBool>,
    cancel: Arc<watch::Sender<bool>>,
}

impl Clone for Orchestrator {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            generator: Arc::clone(&self.generator),
            events: Arc::clone(&self.events),
            config: self.config.clone(),
            in_flight: self.in_flight.clone(),
            closing: Arc::clone(&self.closing),
            cancel: Arc::clone(&self.cancel),
        }
    }
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ReportStore>,
        generator: Arc<dyn ReportGenerator>,
        mut config: OrchestratorConfig,
    ) -> Self {
        if config.processing_timeout.is_zero() {
            config.processing_timeout = DEFAULT_PROCESSING_TIMEOUT;
        }
        let (cancel, _) = watch::channel(false);
        Self {
            store,
            generator,
            events: Arc::new(TracingSink),
            config,
            in_flight: InFlight::default(),
            closing: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(cancel),
        }
    }

    /// Replace the default [`TracingSink`].
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Accept an analysis request for `event_id`.
    ///
    /// Returns the new PENDING record without waiting for generation. Fails
    /// with `AlreadyExists` (carrying the existing record) when the event
    /// already has a report. Must be called from within a tokio runtime.
    pub fn create_report(
        &self,
        event_id: &str,
        request: CreateAnalysisRequest,
    ) -> Result<AnalysisReport> {
        let event_id = event_id.trim();
        if event_id.is_empty() {
            count_request("invalid");
            return Err(Error::EventIdRequired);
        }

        if self.closing.load(Ordering::SeqCst) {
            count_request("unavailable");
            return Err(Error::Unavailable("orchestrator is shutting down".into()));
        }
        if let Err(e) = self.generator.check_ready() {
            count_request("unavailable");
            warn!(event_id, generator = self.generator.name(), error = %e, "rejecting analysis request");
            return Err(e);
        }

        let report = match self.store.create(AnalysisReport::pending(event_id, Utc::now())) {
            Ok(report) => report,
            Err(err) => {
                if let Some(existing) = err.existing_report() {
                    count_request("duplicate");
                    self.events.emit(ReportEvent::now(EventKind::ReportDuplicate {
                        event_id: event_id.to_string(),
                        existing_id: existing.report_id,
                        existing_status: existing.status,
                    }));
                } else {
                    count_request("error");
                }
                return Err(err);
            }
        };

        count_request("accepted");
        self.events.emit(ReportEvent::now(EventKind::ReportCreated {
            report_id: report.report_id,
            event_id: report.event_id.clone(),
        }));

        let job = Job {
            report_id: report.report_id,
            event_id: report.event_id.clone(),
            event_context: request.event_context,
        };
        let guard = self.in_flight.enter();
        let worker = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            worker.run_analysis(job).await;
        });

        Ok(report)
    }

    /// Snapshot of a report. Ids that do not parse are simply not found.
    pub fn get_report(&self, report_id: &str) -> Result<AnalysisReport> {
        let report_id = report_id.trim();
        if report_id.is_empty() {
            return Err(Error::ReportIdRequired);
        }
        let id: ReportId = report_id
            .parse()
            .map_err(|_| Error::NotFound(report_id.to_string()))?;
        self.store.get(id)
    }

    /// Number of background units that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    /// Resolves once no background unit is running.
    pub async fn wait_idle(&self) {
        self.in_flight.wait_idle().await;
    }

    /// Stop accepting work and drain.
    ///
    /// Waits up to `grace` for running units, then cancels the rest; those
    /// record FAILED before this returns.
    pub async fn shutdown(&self, grace: Duration) {
        self.closing.store(true, Ordering::SeqCst);
        let draining = self.in_flight();
        if draining > 0 {
            info!(in_flight = draining, grace_secs = grace.as_secs_f64(), "draining analysis jobs");
        }

        if tokio::time::timeout(grace, self.wait_idle()).await.is_err() {
            warn!(
                in_flight = self.in_flight(),
                "grace period elapsed, cancelling analysis jobs"
            );
            self.cancel.send_replace(true);
            self.wait_idle().await;
        }
    }
}

fn count_request(result: &'static str) {
    metrics::reports_created().add(1, &[KeyValue::new("result", result)]);
}

//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use ai_engine::error::{Error, Result};
use ai_engine::event::NoopSink;
use ai_engine::generator::{GenerationContext, GenerationInput, ReportGenerator};
use ai_engine::model::{AnalysisReport, GeneratedReport, ReportId, RootCauseAnalysis};
use ai_engine::store::{InMemoryReportStore, ReportStore, ReportTransform};
use ai_engine::{Orchestrator, OrchestratorConfig};
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Succeeds immediately, echoing the event context into `raw_llm_response`.
#[derive(Default)]
pub struct StubGenerator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ReportGenerator for StubGenerator {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(
        &self,
        _ctx: &GenerationContext,
        input: GenerationInput,
    ) -> Result<GeneratedReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GeneratedReport {
            event_summary: format!("summary of {}", input.event_id),
            root_cause_analysis: RootCauseAnalysis {
                text: "connection pool exhausted".into(),
                confidence_score: 1.7,
                ..Default::default()
            },
            raw_llm_response: Some(serde_json::Value::Object(input.event_context)),
            ..Default::default()
        })
    }
}

/// Always fails with the given message.
pub struct FailingGenerator(pub &'static str);

#[async_trait]
impl ReportGenerator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(
        &self,
        _ctx: &GenerationContext,
        _input: GenerationInput,
    ) -> Result<GeneratedReport> {
        Err(Error::Generation(self.0.to_string()))
    }
}

/// Never returns and ignores its context.
pub struct HangingGenerator;

#[async_trait]
impl ReportGenerator for HangingGenerator {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn generate(
        &self,
        _ctx: &GenerationContext,
        _input: GenerationInput,
    ) -> Result<GeneratedReport> {
        std::future::pending().await
    }
}

/// Sleeps for a fixed time (honoring the context), then succeeds.
pub struct SlowGenerator(pub Duration);

#[async_trait]
impl ReportGenerator for SlowGenerator {
    fn name(&self) -> &str {
        "slow"
    }

    async fn generate(
        &self,
        ctx: &GenerationContext,
        input: GenerationInput,
    ) -> Result<GeneratedReport> {
        tokio::select! {
            _ = tokio::time::sleep(self.0) => {}
            reason = ctx.done() => return Err(reason),
        }
        StubGenerator::default().generate(ctx, input).await
    }
}

/// Reports itself unavailable.
pub struct UnavailableGenerator;

#[async_trait]
impl ReportGenerator for UnavailableGenerator {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn check_ready(&self) -> Result<()> {
        Err(Error::Unavailable("no analysis templates configured".into()))
    }

    async fn generate(
        &self,
        _ctx: &GenerationContext,
        _input: GenerationInput,
    ) -> Result<GeneratedReport> {
        Err(Error::Unavailable("no analysis templates configured".into()))
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// In-memory store whose updates can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryReportStore,
    pub fail_updates: AtomicBool,
}

impl ReportStore for FlakyStore {
    fn create(&self, report: AnalysisReport) -> Result<AnalysisReport> {
        self.inner.create(report)
    }

    fn get(&self, report_id: ReportId) -> Result<AnalysisReport> {
        self.inner.get(report_id)
    }

    fn update(&self, report_id: ReportId, transform: ReportTransform<'_>) -> Result<AnalysisReport> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::Other("store offline".into()));
        }
        self.inner.update(report_id, transform)
    }
}

// ---------------------------------------------------------------------------
// Orchestrators
// ---------------------------------------------------------------------------

pub fn orchestrator_with(
    generator: Arc<dyn ReportGenerator>,
    processing_timeout: Duration,
) -> Orchestrator {
    Orchestrator::new(
        Arc::new(InMemoryReportStore::new()),
        generator,
        OrchestratorConfig { processing_timeout },
    )
    .with_event_sink(Arc::new(NoopSink))
}

pub fn stub_orchestrator() -> Orchestrator {
    orchestrator_with(Arc::new(StubGenerator::default()), Duration::from_secs(5))
}

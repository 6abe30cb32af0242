//! Report generation.
//!
//! A [`ReportGenerator`] is the only source of analysis content. It may block
//! on I/O or simulated work, but it must give up as soon as its
//! [`GenerationContext`] is done. Two implementations ship with the crate:
//! [`TemplateReportGenerator`] picks a canned analysis per event, and
//! [`RemoteReportGenerator`] asks a text-generation endpoint.

mod extract;
mod remote;
mod template;

pub use remote::{PromptTemplate, RemoteReportGenerator, load_prompt_catalog};
pub use template::TemplateReportGenerator;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::model::GeneratedReport;

/// What a generator gets to work with for one job.
#[derive(Debug, Clone, Default)]
pub struct GenerationInput {
    pub event_id: String,
    pub event_context: serde_json::Map<String, serde_json::Value>,
}

/// Roughly 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Deadline and cancellation signal for one generation call.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    deadline: Instant,
    timeout: Duration,
    cancel: watch::Receiver<bool>,
}

impl GenerationContext {
    /// Context that ends after `timeout` or when `cancel` flips to `true`.
    ///
    /// Timeouts too large to represent as an instant end in the far future.
    pub fn new(timeout: Duration, cancel: watch::Receiver<bool>) -> Self {
        let now = Instant::now();
        Self {
            deadline: now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE),
            timeout,
            cancel,
        }
    }

    /// Context bounded only by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let (_never_cancelled, cancel) = watch::channel(false);
        Self::new(timeout, cancel)
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves when the context ends, yielding the reason as an error.
    pub async fn done(&self) -> Error {
        let mut cancel = self.cancel.clone();
        tokio::select! {
            _ = tokio::time::sleep_until(self.deadline) => Error::GenerationTimeout(self.timeout),
            _ = wait_cancelled(&mut cancel) => Error::Cancelled,
        }
    }
}

async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    let closed = cancel.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        // Sender gone without cancelling: this context can only time out.
        std::future::pending::<()>().await;
    }
}

/// Pluggable source of analysis content.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Short label used in logs and metrics.
    fn name(&self) -> &str;

    /// Fails with `Unavailable` when the generator has no usable
    /// configuration at all. Checked before a job is accepted.
    fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Produce the analysis for one event.
    ///
    /// Must return promptly once `ctx.done()` resolves, and must be safe to
    /// call concurrently with independent inputs.
    async fn generate(
        &self,
        ctx: &GenerationContext,
        input: GenerationInput,
    ) -> Result<GeneratedReport>;
}

/// Build the generator selected by configuration.
pub fn from_config(config: &GeneratorConfig) -> Result<Arc<dyn ReportGenerator>> {
    match config {
        GeneratorConfig::Template { path, delay } => {
            let generator = TemplateReportGenerator::from_file(path, *delay)?;
            tracing::info!(
                path = %path.display(),
                templates = generator.len(),
                "template report generator loaded"
            );
            Ok(Arc::new(generator))
        }
        GeneratorConfig::Remote(remote) => {
            let generator = RemoteReportGenerator::from_config(remote)?;
            tracing::info!(endpoint = %remote.endpoint, model = %remote.model, "remote report generator configured");
            Ok(Arc::new(generator))
        }
    }
}

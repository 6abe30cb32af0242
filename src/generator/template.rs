//! Template-backed generator: canned analyses selected per event.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{GenerationContext, GenerationInput, ReportGenerator};
use crate::error::{Error, Result};
use crate::model::GeneratedReport;

/// On-disk catalog layout (JSON, or TOML with `[[analysis_templates]]`).
#[derive(Debug, Deserialize)]
struct TemplateCatalog {
    #[serde(default)]
    analysis_templates: Vec<GeneratedReport>,
}

/// Picks one of a fixed set of analyses by hashing the event id, after an
/// optional artificial delay. Deterministic per event id.
pub struct TemplateReportGenerator {
    templates: Vec<GeneratedReport>,
    delay: Duration,
}

impl TemplateReportGenerator {
    pub fn new(templates: Vec<GeneratedReport>, delay: Duration) -> Self {
        Self { templates, delay }
    }

    /// Load a template catalog. `.toml` files are parsed as TOML, anything
    /// else as JSON. An empty catalog loads, but the generator will report
    /// itself unavailable.
    pub fn from_file(path: &Path, delay: Duration) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read template catalog {}: {e}", path.display()))
        })?;

        let catalog: TemplateCatalog = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).map_err(|e| {
                Error::Config(format!("bad template catalog {}: {e}", path.display()))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                Error::Config(format!("bad template catalog {}: {e}", path.display()))
            })?
        };

        if catalog.analysis_templates.is_empty() {
            tracing::warn!(path = %path.display(), "template catalog is empty");
        }

        Ok(Self::new(catalog.analysis_templates, delay))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn pick(&self, event_id: &str) -> Option<&GeneratedReport> {
        if self.templates.is_empty() {
            return None;
        }
        let digest = Sha256::digest(event_id.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let index = u64::from_be_bytes(prefix) % self.templates.len() as u64;
        self.templates.get(index as usize)
    }
}

#[async_trait]
impl ReportGenerator for TemplateReportGenerator {
    fn name(&self) -> &str {
        "template"
    }

    fn check_ready(&self) -> Result<()> {
        if self.templates.is_empty() {
            return Err(Error::Unavailable("no analysis templates configured".into()));
        }
        Ok(())
    }

    async fn generate(
        &self,
        ctx: &GenerationContext,
        input: GenerationInput,
    ) -> Result<GeneratedReport> {
        self.check_ready()?;

        if !self.delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                reason = ctx.done() => return Err(reason),
            }
        }

        let mut payload = self
            .pick(&input.event_id)
            .cloned()
            .ok_or_else(|| Error::Unavailable("no analysis templates configured".into()))?;

        if payload.event_summary.is_empty() && !input.event_id.is_empty() {
            payload.event_summary = format!("Analysis report for event {}", input.event_id);
        }

        Ok(payload)
    }
}

//! Generator backed by a remote text-generation endpoint.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;

use super::extract::{build_report, extract_text, token_usage};
use super::{GenerationContext, GenerationInput, ReportGenerator};
use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::model::GeneratedReport;
use crate::telemetry::genai;

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 800;

/// A per-event prompt override.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplate {
    pub event_id: String,
    #[serde(default)]
    pub title: String,
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
struct PromptCatalog {
    #[serde(default)]
    events: Vec<PromptTemplate>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
    metadata: RequestMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct RequestMetadata<'a> {
    event_id: &'a str,
    title: &'a str,
}

/// Posts a prompt to a completion-style HTTP endpoint and turns the reply
/// into a report.
pub struct RemoteReportGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    provider: String,
    request_timeout: Duration,
    prompts: HashMap<String, PromptTemplate>,
}

impl RemoteReportGenerator {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let provider = Url::parse(&endpoint)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key: None,
            model: model.into(),
            provider,
            request_timeout: Duration::from_secs(15),
            prompts: HashMap::new(),
        }
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let mut generator = Self::new(&config.endpoint, &config.model)
            .with_request_timeout(config.request_timeout);
        if let Some(key) = &config.api_key {
            generator = generator.with_api_key(key.clone());
        }
        if let Some(path) = &config.prompt_catalog {
            generator = generator.with_prompts(load_prompt_catalog(path)?);
        }
        Ok(generator)
    }

    pub fn with_api_key(mut self, key: SecretString) -> Self {
        self.api_key = Some(key);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_prompts(mut self, prompts: impl IntoIterator<Item = PromptTemplate>) -> Self {
        self.prompts = prompts
            .into_iter()
            .map(|p| (p.event_id.clone(), p))
            .collect();
        self
    }

    fn prompt_for(&self, input: &GenerationInput) -> (String, String) {
        if let Some(template) = self.prompts.get(&input.event_id) {
            return (template.prompt.clone(), template.title.clone());
        }

        let context = if input.event_context.is_empty() {
            "{}".to_string()
        } else {
            serde_json::to_string_pretty(&input.event_context).unwrap_or_else(|_| "{}".into())
        };
        let prompt = format!(
            "You are an SRE assistant analysing an operational event.\n\
             Event id: {}\n\
             Event context:\n{context}\n\n\
             Reply with a single JSON object with the keys event_summary, \
             root_cause_analysis {{text, confidence_score, probable_causes}}, \
             impact_assessment {{text, severity}} and recommended_actions \
             [{{title, action_type, risk, summary}}].",
            input.event_id
        );
        (prompt, format!("Event {}", input.event_id))
    }

    async fn call(&self, ctx: &GenerationContext, input: &GenerationInput) -> Result<GeneratedReport> {
        let (prompt, title) = self.prompt_for(input);
        let body = CompletionRequest {
            model: &self.model,
            prompt: &prompt,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            metadata: RequestMetadata {
                event_id: &input.event_id,
                title: &title,
            },
        };

        let timeout = self.request_timeout.min(ctx.remaining());
        let mut request = self.client.post(&self.endpoint).timeout(timeout).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(describe)?;
        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(Error::Generation(format!(
                "text generation endpoint returned status {}",
                status.as_u16()
            )));
        }

        let bytes = response.bytes().await.map_err(describe)?;
        let raw: Value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        if let Some((input_tokens, output_tokens)) = token_usage(&raw) {
            genai::record_token_usage(&tracing::Span::current(), input_tokens, output_tokens);
        }

        let text = match &raw {
            Value::String(s) => s.trim().to_string(),
            other => extract_text(other).unwrap_or_else(|| other.to_string()),
        };
        if text.is_empty() {
            return Err(Error::Generation(
                "text generation endpoint returned an empty response".into(),
            ));
        }

        Ok(build_report(&input.event_id, &text, raw))
    }
}

fn describe(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Generation("text generation request timed out".into())
    } else if err.is_connect() {
        Error::Generation(format!("cannot reach text generation endpoint: {err}"))
    } else {
        Error::Generation(format!("text generation request failed: {err}"))
    }
}

/// Read a prompt catalog (`{"events": [...]}`).
pub fn load_prompt_catalog(path: &Path) -> Result<Vec<PromptTemplate>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("cannot read prompt catalog {}: {e}", path.display()))
    })?;
    let catalog: PromptCatalog = serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("bad prompt catalog {}: {e}", path.display())))?;
    Ok(catalog.events)
}

#[async_trait]
impl ReportGenerator for RemoteReportGenerator {
    fn name(&self) -> &str {
        "remote"
    }

    fn check_ready(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| Error::Unavailable(format!("invalid endpoint {}: {e}", self.endpoint)))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(Error::Unavailable(format!(
                "unsupported endpoint scheme {other}"
            ))),
        }
    }

    async fn generate(
        &self,
        ctx: &GenerationContext,
        input: GenerationInput,
    ) -> Result<GeneratedReport> {
        self.check_ready()?;

        let span = genai::start_chat_span(&self.model, &self.provider);
        tokio::select! {
            result = self.call(ctx, &input).instrument(span) => result,
            reason = ctx.done() => Err(reason),
        }
    }
}

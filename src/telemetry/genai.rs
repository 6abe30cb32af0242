//! GenAI semantic convention span helpers for text-generation calls.
//!
//! Uses OpenTelemetry GenAI semantic conventions:
//! - `gen_ai.operation.name`
//! - `gen_ai.request.model`
//! - `gen_ai.provider.name`
//! - `gen_ai.usage.input_tokens`
//! - `gen_ai.usage.output_tokens`

use tracing::Span;

/// Start a span for one completion request.
///
/// Token usage fields are declared empty and can be filled later via
/// [`record_token_usage`].
pub fn start_chat_span(model: &str, provider: &str) -> Span {
    tracing::info_span!(
        "gen_ai.chat",
        "gen_ai.operation.name" = "chat",
        "gen_ai.request.model" = model,
        "gen_ai.provider.name" = provider,
        "gen_ai.usage.input_tokens" = tracing::field::Empty,
        "gen_ai.usage.output_tokens" = tracing::field::Empty,
    )
}

/// Record token usage on a span made by [`start_chat_span`], and count it.
pub fn record_token_usage(span: &Span, input: u64, output: u64) {
    span.record("gen_ai.usage.input_tokens", input);
    span.record("gen_ai.usage.output_tokens", output);

    let tokens = super::metrics::llm_tokens();
    tokens.add(input, &[opentelemetry::KeyValue::new("direction", "input")]);
    tokens.add(output, &[opentelemetry::KeyValue::new("direction", "output")]);
}

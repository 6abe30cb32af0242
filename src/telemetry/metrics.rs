//! Metric instrument factories.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Instruments come from the `"ai-engine"` meter; without an OTLP endpoint
//! the global provider is a no-op and recording costs nothing.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("ai-engine")
}

/// Counter: analysis requests.
/// Labels: `result` ("accepted" | "duplicate" | "invalid" | "unavailable" | "error").
pub fn reports_created() -> Counter<u64> {
    meter()
        .u64_counter("ai_engine.reports.created")
        .with_description("Number of analysis requests by outcome")
        .build()
}

/// Counter: report state transitions.
/// Labels: `from`, `to`.
pub fn report_state_transitions() -> Counter<u64> {
    meter()
        .u64_counter("ai_engine.reports.state_transitions")
        .with_description("Number of report state transitions")
        .build()
}

/// Histogram: generator call duration in milliseconds.
/// Labels: `generator`, `outcome` ("success" | "failed").
pub fn generation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("ai_engine.generation.duration_ms")
        .with_description("Report generation duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: background store writes that failed.
/// Labels: `target`.
pub fn store_update_failures() -> Counter<u64> {
    meter()
        .u64_counter("ai_engine.store.update_failures")
        .with_description("Background report updates rejected by the store")
        .build()
}

/// Counter: text-generation token usage.
/// Labels: `direction` ("input" | "output").
pub fn llm_tokens() -> Counter<u64> {
    meter()
        .u64_counter("ai_engine.llm.tokens")
        .with_description("Text generation token usage")
        .build()
}

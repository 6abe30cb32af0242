//! # ai-engine
//!
//! Asynchronous event analysis. A client asks for an analysis of an
//! operational event and immediately gets a report id back; a background
//! task asks a [`generator::ReportGenerator`] for the analysis and records
//! the outcome, which the client later fetches by polling.
//!
//! The [`engine::Orchestrator`] owns the lifecycle, [`store`] keeps the
//! records, and [`http`] exposes both over a small JSON API.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod generator;
pub mod http;
pub mod model;
pub mod store;
pub mod telemetry;

pub use engine::{Orchestrator, OrchestratorConfig};
pub use error::{Error, Result};

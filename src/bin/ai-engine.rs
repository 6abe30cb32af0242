//! ai-engine CLI: run the analysis service, or analyse one event in-process.

use std::net::SocketAddr;
use std::sync::Arc;

use ai_engine::config::Config;
use ai_engine::model::CreateAnalysisRequest;
use ai_engine::store::InMemoryReportStore;
use ai_engine::telemetry::{TelemetryConfig, init_telemetry};
use ai_engine::{Orchestrator, OrchestratorConfig, generator, http};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ai-engine", about = "Asynchronous event analysis service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service until Ctrl-C
    Serve {
        /// Listen address (overrides AI_ENGINE_ADDR / PORT)
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Analyse one event and print the finished report
    Analyze {
        /// Event to analyse
        event_id: String,
        /// Event context as a JSON object
        #[arg(long)]
        context: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "ai-engine".to_string(),
        log_level: config.log_level.clone(),
    })?;

    match cli.command {
        Command::Serve { addr } => cmd_serve(config, addr).await,
        Command::Analyze { event_id, context } => cmd_analyze(config, event_id, context).await,
    }
}

fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator> {
    let generator = generator::from_config(&config.generator)?;
    Ok(Orchestrator::new(
        Arc::new(InMemoryReportStore::new()),
        generator,
        OrchestratorConfig {
            processing_timeout: config.processing_timeout,
        },
    ))
}

async fn cmd_serve(config: Config, addr: Option<SocketAddr>) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(&config)?;
    let listener = tokio::net::TcpListener::bind(addr.unwrap_or(config.listen_addr)).await?;

    http::serve(listener, orchestrator.clone(), async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        tracing::info!("received shutdown signal");
    })
    .await?;

    orchestrator.shutdown(config.shutdown_grace).await;
    Ok(())
}

async fn cmd_analyze(
    config: Config,
    event_id: String,
    context: Option<String>,
) -> anyhow::Result<()> {
    let request = match context {
        Some(json) => CreateAnalysisRequest {
            event_context: serde_json::from_str(&json)
                .map_err(|e| anyhow::anyhow!("--context must be a JSON object: {e}"))?,
        },
        None => CreateAnalysisRequest::default(),
    };

    let orchestrator = build_orchestrator(&config)?;
    let report = orchestrator.create_report(&event_id, request)?;
    orchestrator.wait_idle().await;

    let report = orchestrator.get_report(&report.report_id.to_string())?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

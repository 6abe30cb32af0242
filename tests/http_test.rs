//! HTTP boundary tests, driven in-process through the router.

mod common;

use std::sync::Arc;
use std::time::Duration;

use ai_engine::Orchestrator;
use ai_engine::generator::TemplateReportGenerator;
use ai_engine::http::{MAX_BODY_SIZE, router};
use ai_engine::model::{GeneratedReport, RootCauseAnalysis};
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::*;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(app: &Router, method: Method, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn post_analysis(app: &Router, event_id: &str, body: &'static str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/api/v1/events/{event_id}/ai-analysis"),
        body,
    )
    .await
}

async fn get_report(app: &Router, report_id: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::GET,
        &format!("/api/v1/ai/analysis-reports/{report_id}"),
        Body::empty(),
    )
    .await
}

fn template_orchestrator(templates: Vec<GeneratedReport>) -> Orchestrator {
    orchestrator_with(
        Arc::new(TemplateReportGenerator::new(templates, Duration::ZERO)),
        Duration::from_secs(5),
    )
}

fn one_template() -> Vec<GeneratedReport> {
    vec![GeneratedReport {
        root_cause_analysis: RootCauseAnalysis {
            text: "pool size lowered by deploy".into(),
            confidence_score: 0.8,
            ..Default::default()
        },
        ..Default::default()
    }]
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accepted_then_polled_to_success() {
    let orchestrator = template_orchestrator(one_template());
    let app = router(orchestrator.clone());

    let (status, body) = post_analysis(&app, "evt-123", "{}").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "PENDING");
    let report_id = body["report_id"].as_str().unwrap().to_string();

    orchestrator.wait_idle().await;

    let (status, report) = get_report(&app, &report_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], "SUCCESS");
    assert_eq!(report["event_id"], "evt-123");
    assert_eq!(report["event_summary"], "Analysis report for event evt-123");
    assert_eq!(
        report["root_cause_analysis"]["text"],
        "pool size lowered by deploy"
    );
    assert!(report["completed_at"].is_string());
    assert!(report.get("error_message").is_none());
}

#[tokio::test]
async fn duplicate_request_conflicts_with_same_report() {
    let orchestrator = template_orchestrator(one_template());
    let app = router(orchestrator.clone());

    let (status, first) = post_analysis(&app, "evt-dup", "").await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, second) = post_analysis(&app, "evt-dup", "{}").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second["report_id"], first["report_id"]);
    assert!(second["error"].is_string());
    assert!(
        ["PENDING", "RUNNING", "SUCCESS"].contains(&second["status"].as_str().unwrap()),
        "{second}"
    );

    orchestrator.wait_idle().await;
}

#[tokio::test]
async fn unknown_report_is_not_found() {
    let app = router(stub_orchestrator());

    let (status, body) = get_report(&app, "unknown-id").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn failing_generator_surfaces_as_failed_report() {
    let orchestrator =
        orchestrator_with(Arc::new(FailingGenerator("upstream refused")), Duration::from_secs(5));
    let app = router(orchestrator.clone());

    let (_, body) = post_analysis(&app, "evt-bad", "{}").await;
    orchestrator.wait_idle().await;

    let (status, report) = get_report(&app, body["report_id"].as_str().unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], "FAILED");
    assert!(!report["error_message"].as_str().unwrap().is_empty());
    assert!(report.get("root_cause_analysis").is_none());
}

// ---------------------------------------------------------------------------
// Request validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let orchestrator = stub_orchestrator();
    let app = router(orchestrator.clone());

    let (status, body) = post_analysis(&app, "evt-1", "{\"event_context\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("malformed"));

    let (status, _) = post_analysis(&app, "evt-1", "{\"event_context\": 5}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(orchestrator.in_flight(), 0);
}

#[tokio::test]
async fn blank_ids_are_bad_requests() {
    let app = router(stub_orchestrator());

    let (status, _) = post_analysis(&app, "%20%20", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_report(&app, "%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_report(&app, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn context_is_forwarded_to_generator() {
    let orchestrator = stub_orchestrator();
    let app = router(orchestrator.clone());

    let (_, body) = post_analysis(
        &app,
        "evt-ctx",
        r#"{"event_context": {"service": "payments", "severity": "HIGH"}}"#,
    )
    .await;
    orchestrator.wait_idle().await;

    let (_, report) = get_report(&app, body["report_id"].as_str().unwrap()).await;
    assert_eq!(
        report["raw_llm_response"],
        json!({"service": "payments", "severity": "HIGH"})
    );
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = router(stub_orchestrator());
    let huge = format!(
        "{{\"event_context\": {{\"blob\": \"{}\"}}}}",
        "x".repeat(MAX_BODY_SIZE + 1)
    );

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/events/evt-big/ai-analysis",
        huge,
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

// ---------------------------------------------------------------------------
// Availability and misc routes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_template_set_is_service_unavailable() {
    let app = router(template_orchestrator(Vec::new()));

    let (status, body) = post_analysis(&app, "evt-1", "{}").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("no analysis templates"));
}

#[tokio::test]
async fn healthz_is_ok() {
    let app = router(stub_orchestrator());
    let (status, body) = send(&app, Method::GET, "/healthz", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn unmatched_route_is_json_not_found() {
    let app = router(stub_orchestrator());
    let (status, body) = send(&app, Method::GET, "/api/v1/nope", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "not found"}));
}

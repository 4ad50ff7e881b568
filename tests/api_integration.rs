//! HTTP-level tests for the questions page and visualization endpoints.
//!
//! The subprocess is replaced by a runner that writes the output page, so
//! these tests need neither Python nor a database.

#![cfg(feature = "server")]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use galileo::api::{create_router, AppState};
use galileo::visualization::{
    Invocation, ProcessOutput, ProcessRunner, RunError, VisualizationConfig,
    VisualizationTrigger,
};

// ── Test app builder ───────────────────────────────────────────

struct PageWritingRunner {
    runs: Mutex<Vec<Invocation>>,
}

#[async_trait]
impl ProcessRunner for PageWritingRunner {
    async fn probe(&self, program: &str) -> bool {
        program == "python3"
    }

    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunError> {
        self.runs.lock().unwrap().push(invocation.clone());
        let body = format!(
            "<html><body>{} vs {}</body></html>",
            invocation.args[1], invocation.args[2]
        );
        std::fs::write(invocation.working_dir.join("visualization.html"), body).unwrap();
        Ok(ProcessOutput {
            success: true,
            exit_code: Some(0),
            ..Default::default()
        })
    }
}

struct TestApp {
    _root: TempDir,
    router: axum::Router,
    runner: Arc<PageWritingRunner>,
}

fn build_test_app() -> TestApp {
    let root = TempDir::new().unwrap();
    let script = root.path().join("public/standalone-viz/iMSMS_emperor.py");
    std::fs::create_dir_all(script.parent().unwrap()).unwrap();
    std::fs::write(&script, "").unwrap();

    let config = VisualizationConfig {
        script_path: Some(script.clone()),
        ..VisualizationConfig::default()
    };
    let runner = Arc::new(PageWritingRunner {
        runs: Mutex::new(Vec::new()),
    });
    let trigger = Arc::new(VisualizationTrigger::new(
        config,
        runner.clone(),
        root.path().to_path_buf(),
    ));

    let state = AppState::new(trigger, 0).unwrap();
    let output_dir: Option<PathBuf> = script.parent().map(|p| p.to_path_buf());

    TestApp {
        _root: root,
        router: create_router(state, output_dir),
        runner,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

// ── Pages ──────────────────────────────────────────────────────

#[tokio::test]
async fn both_routes_render_the_questions_page() {
    let app = build_test_app();

    for uri in ["/", "/galileo/questions"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains(r#"id="seeViz""#), "{uri}");
    }
}

#[tokio::test]
async fn health_check_reports_ok() {
    let app = build_test_app();
    let (status, body) = send(&app, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["data"], "OK");
}

// ── Visualization ──────────────────────────────────────────────

#[tokio::test]
async fn empty_variable_is_bad_request() {
    let app = build_test_app();
    let (status, body) = send(
        &app,
        post_json(
            "/api/visualization",
            serde_json::json!({"variable1": "age", "variable2": ""}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json(&body);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid-params");
    assert!(app.runner.runs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_field_is_bad_request() {
    let app = build_test_app();
    let (status, body) = send(
        &app,
        post_json("/api/visualization", serde_json::json!({"variable1": "age"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "invalid-params");
}

#[tokio::test]
async fn successful_run_is_served_and_reported_ready() {
    let app = build_test_app();

    let (status, body) = send(&app, get("/api/visualization/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["ready"], false);

    let (status, body) = send(
        &app,
        post_json(
            "/api/visualization",
            serde_json::json!({"variable1": "age", "variable2": "bmi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let outcome = json(&body);
    assert_eq!(outcome["success"], true);
    assert_eq!(outcome["outputPath"], "/standalone-viz/visualization.html");
    assert_eq!(app.runner.runs.lock().unwrap().len(), 1);

    let (_, body) = send(&app, get("/api/visualization/status")).await;
    assert_eq!(json(&body)["ready"], true);

    let (status, body) = send(&app, get("/standalone-viz/visualization.html")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("age vs bmi"));
}

#[tokio::test]
async fn results_path_redirects_to_output() {
    let app = build_test_app();
    let response = app
        .router
        .clone()
        .oneshot(get("/galileo/visualization"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/standalone-viz/visualization.html"
    );
}

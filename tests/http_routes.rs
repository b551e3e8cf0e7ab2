// tests/http_routes.rs

mod common;
use crate::common::fakes::{stdout_result, FakeExecutor, FakeExporter};
use crate::common::{init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use indexcast::exec::{EnvironmentDescriptor, ExecError, ExecutionResult};
use indexcast::server::{create_router, AppState};
use indexcast::store::IndexStore;
use indexcast::tasks::{ForecastTask, PortfolioTask};
use indexcast::types::{IndexKey, SelectorPolicy};

const PAYLOAD: &str = r#"{"dates": ["2024-01-02"], "values": [4742.83]}"#;

struct TestApp {
    router: Router,
    executor: Arc<FakeExecutor>,
    exporter: Arc<FakeExporter>,
    environment: Arc<EnvironmentDescriptor>,
    _interpreter: NamedTempFile,
}

impl TestApp {
    fn new(policy: SelectorPolicy) -> Self {
        let interpreter = NamedTempFile::new().expect("create fake interpreter");
        let environment = Arc::new(
            EnvironmentDescriptor::new(interpreter.path(), "ssd", Duration::from_secs(10))
                .expect("valid environment"),
        );

        let store = IndexStore::in_memory().expect("in-memory store");
        store
            .insert_row("2024-01-02", &[(IndexKey::Sp500, 4742.83), (IndexKey::MsciEm, 1002.5)])
            .expect("insert row");

        let executor = Arc::new(FakeExecutor::new(PAYLOAD));
        let exporter = Arc::new(FakeExporter::new("assets"));

        let state = AppState {
            forecast: Arc::new(ForecastTask::new(
                executor.clone(),
                exporter.clone(),
                "forecast.py",
            )),
            portfolio: Arc::new(PortfolioTask::new(
                executor.clone(),
                exporter.clone(),
                "portfolio.py",
            )),
            store,
            environment: Arc::clone(&environment),
            selector_policy: policy,
        };

        Self {
            router: create_router(state),
            executor,
            exporter,
            environment,
            _interpreter: interpreter,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = with_timeout(self.router.clone().oneshot(request))
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, String::from_utf8(bytes.to_vec()).expect("utf-8 body"))
    }

    async fn get(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("build request");
        self.send(request).await
    }
}

fn error_kind(body: &str) -> String {
    let json: serde_json::Value = serde_json::from_str(body).expect("error body is JSON");
    json["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn forecast_returns_script_output_verbatim() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Clamp);

    let request = Request::builder()
        .uri("/forecast/3")
        .body(Body::empty())
        .unwrap();
    let response = with_timeout(app.router.clone().oneshot(request))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body, format!("{PAYLOAD}\n").as_bytes());
    assert_eq!(app.exporter.exported(), vec![IndexKey::MsciEm]);
}

#[tokio::test]
async fn forecast_clamps_out_of_range_selectors_by_default() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Clamp);

    let (status, _) = app.get("/forecast/42").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/forecast/-1").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        app.exporter.exported(),
        vec![IndexKey::UsTreasury, IndexKey::Sp500]
    );
}

#[tokio::test]
async fn forecast_rejects_out_of_range_selectors_when_configured() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Reject);

    let (status, body) = app.get("/forecast/7").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_kind(&body), "selector_out_of_range");
    assert!(app.executor.calls().is_empty());
}

#[tokio::test]
async fn non_numeric_selector_is_a_client_error() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Clamp);

    let (status, _) = app.get("/forecast/gold").await;

    assert!(status.is_client_error(), "got {status}");
    assert!(app.executor.calls().is_empty());
}

#[tokio::test]
async fn script_timeout_maps_to_gateway_timeout() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Clamp);
    app.executor.push_response(Err(ExecError::Timeout {
        timeout: Duration::from_secs(10),
        partial: stdout_result("half a line"),
    }));

    let (status, body) = app.get("/forecast/0").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(error_kind(&body), "timeout");
}

#[tokio::test]
async fn empty_script_output_maps_to_bad_gateway() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Clamp);
    app.executor.push_response(Ok(ExecutionResult::default()));

    let (status, body) = app.get("/forecast/1").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error_kind(&body), "empty_output");
}

#[tokio::test]
async fn export_failure_maps_to_internal_error() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Clamp);
    app.exporter.fail_on(IndexKey::GoldSpot);

    let (status, body) = app.get("/forecast/2").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_kind(&body), "export_failed");
    assert!(app.executor.calls().is_empty());
}

#[tokio::test]
async fn portfolio_route_runs_the_optimizer() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Clamp);

    let (status, body) = app.get("/portfolio").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("{PAYLOAD}\n"));
    assert_eq!(app.exporter.exported().len(), IndexKey::COUNT);
    assert_eq!(app.executor.calls().len(), 1);
}

#[tokio::test]
async fn indices_lists_every_row_with_all_columns() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Clamp);

    let (status, body) = app.get("/indices").await;
    assert_eq!(status, StatusCode::OK);

    let rows: serde_json::Value = serde_json::from_str(&body).unwrap();
    let rows = rows.as_array().expect("array of rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["date"], "2024-01-02");

    let values = rows[0]["values"].as_array().unwrap();
    assert_eq!(values.len(), IndexKey::COUNT);
    assert_eq!(values[0]["index"], "S&P_500_INDEX");
    assert_eq!(values[0]["value"], 4742.83);
    assert!(values[2]["value"].is_null());
}

#[tokio::test]
async fn health_reports_ok() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Clamp);

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn timeout_can_be_read_and_adjusted_at_runtime() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Clamp);

    let (status, body) = app.get("/runtime/timeout").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"timeout_ms":10000}"#);

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/runtime/timeout")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"timeout_ms": 2500}"#))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.environment.timeout(), Duration::from_millis(2500));

    let (_, body) = app.get("/runtime/timeout").await;
    assert_eq!(body, r#"{"timeout_ms":2500}"#);
}

#[tokio::test]
async fn zero_timeout_is_rejected() {
    init_tracing();
    let app = TestApp::new(SelectorPolicy::Clamp);

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/runtime/timeout")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"timeout_ms": 0}"#))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_kind(&body), "bad_request");
    assert_eq!(app.environment.timeout(), Duration::from_secs(10));
}

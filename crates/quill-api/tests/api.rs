//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use quill_api::{create_router, ApiConfig, AppState, StoreBackend};
use quill_models::{CacheKey, ComputeKind};
use quill_storage::MemoryArtifactStore;
use quill_worker::{
    ComputeEngine, ComputeInput, Engines, Orchestrator, WorkerConfig, WorkerError, WorkerResult,
};

struct StubEngine {
    kind: ComputeKind,
    fail_on: Option<&'static str>,
    calls: AtomicUsize,
}

impl StubEngine {
    fn new(kind: ComputeKind) -> Self {
        Self {
            kind,
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ComputeEngine for StubEngine {
    fn kind(&self) -> ComputeKind {
        self.kind
    }

    fn requires_asset(&self) -> bool {
        false
    }

    async fn compute(&self, input: ComputeInput<'_>) -> WorkerResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        if self.fail_on == Some(input.source_ref) {
            return Err(WorkerError::Subprocess {
                message: "aligner exited with status 1".into(),
                exit_code: Some(1),
                stderr: Some("Traceback: model not found".into()),
            });
        }
        Ok(json!({
            "segments": [],
            "word_segments": [],
            "reference_text": input.aux_text,
        }))
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryArtifactStore>,
    alignment: Arc<StubEngine>,
    _work_dir: tempfile::TempDir,
}

fn test_app() -> TestApp {
    let work_dir = tempfile::TempDir::new().unwrap();
    let worker_config = WorkerConfig {
        work_dir: work_dir.path().to_path_buf(),
        batch_poll_interval: Duration::from_millis(10),
        ..WorkerConfig::default()
    };

    let store = Arc::new(MemoryArtifactStore::new());
    let alignment = Arc::new(StubEngine {
        fail_on: Some("https://media.test/broken.wav"),
        ..StubEngine::new(ComputeKind::Alignment)
    });
    let engines = Engines {
        transcription: Arc::new(StubEngine::new(ComputeKind::Transcription)),
        extraction: Arc::new(StubEngine::new(ComputeKind::Extraction)),
        alignment: alignment.clone(),
    };

    let orchestrator = Orchestrator::new(&worker_config, store.clone(), engines).unwrap();
    let config = ApiConfig {
        store_backend: StoreBackend::Memory,
        ..ApiConfig::default()
    };
    let state = AppState::new(config, Arc::new(orchestrator));

    TestApp {
        router: create_router(state, None),
        store,
        alignment,
        _work_dir: work_dir,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// Poll until the job leaves pending/processing.
async fn poll_until_done(router: &Router, kind: &str, key: &str) -> (StatusCode, Value) {
    for _ in 0..200 {
        let (status, body) = send(router, get(&format!("/api/{}/status/{}", kind, key))).await;
        if status != StatusCode::ACCEPTED {
            return (status, body);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never finished", key);
}

#[tokio::test]
async fn test_submit_poll_then_cached() {
    let app = test_app();
    let source = "https://media.test/talk.wav";

    let (status, body) = send(
        &app.router,
        post_json("/api/alignment", json!({ "sourceRef": source, "auxText": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "started");
    let key = body["key"].as_str().unwrap().to_string();
    assert_eq!(key, CacheKey::derive(source).as_str());

    let (status, body) = poll_until_done(&app.router, "alignment", &key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"]["reference_text"], "hello");

    let (status, body) = send(
        &app.router,
        post_json("/api/alignment", json!({ "sourceRef": source })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cached");
    assert_eq!(body["key"], key);
    assert!(body["result"].is_object());
    assert_eq!(app.alignment.calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.store.put_count(), 1);
}

#[tokio::test]
async fn test_duplicate_submit_reports_in_flight() {
    let app = test_app();
    let request = || post_json("/api/alignment", json!({ "sourceRef": "https://media.test/a.wav" }));

    let (first, _) = send(&app.router, request()).await;
    let (second, body) = send(&app.router, request()).await;

    assert_eq!(first, StatusCode::ACCEPTED);
    assert_eq!(second, StatusCode::ACCEPTED);
    assert!(matches!(
        body["status"].as_str(),
        Some("pending") | Some("processing")
    ));

    let key = body["key"].as_str().unwrap().to_string();
    poll_until_done(&app.router, "alignment", &key).await;
    assert_eq!(app.alignment.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_submit_rejects_bad_input() {
    let app = test_app();

    let (status, _) = send(&app.router, post_json("/api/transcription", json!({ "sourceRef": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, post_json("/api/transcription", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = Request::post("/api/extraction")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app.router, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_poll_bad_and_unknown_keys() {
    let app = test_app();

    let (status, _) = send(&app.router, get("/api/alignment/status/not-a-key")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = CacheKey::derive("https://media.test/never-submitted.wav");
    let (status, _) = send(
        &app.router,
        get(&format!("/api/alignment/status/{}", unknown)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_poll_by_body() {
    let app = test_app();
    let (_, body) = send(
        &app.router,
        post_json("/api/transcription", json!({ "sourceRef": "https://media.test/b.wav" })),
    )
    .await;
    let key = body["key"].as_str().unwrap().to_string();
    poll_until_done(&app.router, "transcription", &key).await;

    let (status, body) = send(
        &app.router,
        post_json("/api/transcription/status", json!({ "key": key })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn test_failed_job_is_reported() {
    let app = test_app();
    let (_, body) = send(
        &app.router,
        post_json("/api/alignment", json!({ "sourceRef": "https://media.test/broken.wav" })),
    )
    .await;
    let key = body["key"].as_str().unwrap().to_string();

    let (status, body) = poll_until_done(&app.router, "alignment", &key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("exit code: 1"), "{}", error);
    assert!(error.contains("model not found"), "{}", error);
    assert_eq!(app.store.put_count(), 0);
}

#[tokio::test]
async fn test_kinds_are_isolated() {
    let app = test_app();
    let (_, body) = send(
        &app.router,
        post_json("/api/transcription", json!({ "sourceRef": "https://media.test/c.wav" })),
    )
    .await;
    let key = body["key"].as_str().unwrap().to_string();
    poll_until_done(&app.router, "transcription", &key).await;

    let (status, _) = send(&app.router, get(&format!("/api/alignment/status/{}", key))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_batch_intake() {
    let app = test_app();

    let (status, _) = send(&app.router, post_json("/api/alignment/batch", json!({ "jobs": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        post_json("/api/alignment/batch", json!({ "jobs": [{ "sourceRef": "" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app.router,
        post_json(
            "/api/alignment/batch",
            json!({ "jobs": [
                { "sourceRef": "https://media.test/1.wav", "auxText": "one" },
                { "sourceRef": "https://media.test/2.wav", "auxText": "two" },
            ] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["accepted"], 2);

    for source in ["https://media.test/1.wav", "https://media.test/2.wav"] {
        let key = CacheKey::derive(source);
        let mut done = false;
        for _ in 0..200 {
            let (status, _) = send(&app.router, get(&format!("/api/alignment/status/{}", key))).await;
            if status == StatusCode::OK {
                done = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(done, "batch entry {} never completed", source);
    }
    assert_eq!(app.alignment.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_batch_is_alignment_only() {
    let app = test_app();
    let (status, _) = send(
        &app.router,
        post_json("/api/transcription/batch", json!({ "jobs": [{ "sourceRef": "x" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = test_app();

    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app.router, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["storage"]["status"], "ok");

    app.store.set_fail_reads(true);
    let (status, body) = send(&app.router, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"]["storage"]["status"], "error");
}

#[tokio::test]
async fn test_store_outage_is_a_server_error() {
    let app = test_app();
    app.store.set_fail_reads(true);

    let (status, body) = send(
        &app.router,
        post_json("/api/alignment", json!({ "sourceRef": "https://media.test/d.wav" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "storage_error");
    assert_eq!(app.alignment.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_queue_status() {
    let app = test_app();
    let (status, body) = send(&app.router, get("/api/queue/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["batch_queued"], 0);
    assert_eq!(body["alignment"]["pending"], 0);
}

#[tokio::test]
async fn test_response_headers() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}

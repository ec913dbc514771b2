//! Alignment jobs against a real subprocess and a mocked source server.
#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quill_media::{Downloader, WorkerRunner};
use quill_models::{ComputeKind, JobStatus};
use quill_queue::JobRegistry;
use quill_storage::{ArtifactCache, MemoryArtifactStore};
use quill_worker::{AlignmentEngine, JobProcessor, Pipeline, PollOutcome, SubmitOutcome};

struct Setup {
    pipeline: Pipeline,
    store: Arc<MemoryArtifactStore>,
    work_dir: tempfile::TempDir,
    server: MockServer,
}

/// Alignment pipeline whose worker is `sh -c <script> align <asset>`.
async fn setup(script: &str) -> Setup {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/talk.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFF-audio".to_vec()))
        .mount(&server)
        .await;

    let work_dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(MemoryArtifactStore::new());
    let registry = Arc::new(JobRegistry::new(
        ComputeKind::Alignment,
        Duration::from_secs(3600),
    ));
    let cache = ArtifactCache::new(store.clone(), ComputeKind::Alignment);
    let engine = AlignmentEngine::new(
        "sh",
        vec!["-c".into(), script.into(), "align".into()],
        WorkerRunner::new().with_timeout(10),
    );
    let processor = Arc::new(JobProcessor::new(
        Arc::new(engine),
        registry.clone(),
        cache.clone(),
        Downloader::new(Duration::from_secs(5), 1024 * 1024).unwrap(),
        work_dir.path(),
    ));

    Setup {
        pipeline: Pipeline::new(registry, cache, processor, Duration::from_millis(10)),
        store,
        work_dir,
        server,
    }
}

async fn run_to_end(setup: &Setup, source: &str) -> (quill_models::CacheKey, JobStatus) {
    let SubmitOutcome::Started { key, handle } = setup.pipeline.submit(source, None).await.unwrap()
    else {
        panic!("expected a fresh job");
    };
    let status = handle.await.unwrap();
    (key, status)
}

fn work_dir_is_empty(setup: &Setup) -> bool {
    std::fs::read_dir(setup.work_dir.path()).unwrap().next().is_none()
}

#[tokio::test]
async fn test_successful_alignment_is_persisted() {
    let setup = setup(
        r#"[ "$(cat "$1")" = "RIFF-audio" ] || exit 4
echo '[PYTHON_LOG] Alignment complete.' >&2
echo '{"segments":[{"start":0.0,"end":0.8,"text":"hi","words":[{"word":"hi","start":0.1,"end":0.5,"score":0.97}]}],"word_segments":[{"word":"hi","start":0.1,"end":0.5,"score":0.97}]}'"#,
    )
    .await;
    let source = format!("{}/talk.wav", setup.server.uri());

    let (key, status) = run_to_end(&setup, &source).await;

    assert_eq!(status, JobStatus::Completed);
    assert_eq!(setup.store.put_count(), 1);
    assert!(work_dir_is_empty(&setup));
    match setup.pipeline.poll(&key).await.unwrap() {
        PollOutcome::Completed { result, .. } => {
            assert_eq!(result["word_segments"][0]["word"], "hi");
        }
        other => panic!("unexpected poll outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_worker_exit_failure() {
    let setup = setup("echo '[PYTHON_ERROR] An error occurred during alignment: boom' >&2; exit 1").await;
    let source = format!("{}/talk.wav", setup.server.uri());

    let (key, status) = run_to_end(&setup, &source).await;

    assert_eq!(status, JobStatus::Error);
    let record = setup.pipeline.registry().get(&key).unwrap();
    let detail = record.error_detail.unwrap();
    assert!(detail.contains("exit code: 1"));
    assert!(detail.contains("[PYTHON_ERROR]"));
    assert!(work_dir_is_empty(&setup));
    assert_eq!(setup.store.put_count(), 0);
}

#[tokio::test]
async fn test_unparseable_output_is_not_persisted() {
    let setup = setup("echo 'not json at all'").await;
    let source = format!("{}/talk.wav", setup.server.uri());

    let (key, status) = run_to_end(&setup, &source).await;

    assert_eq!(status, JobStatus::Error);
    match setup.pipeline.poll(&key).await.unwrap() {
        PollOutcome::Failed { error, .. } => {
            assert!(error.starts_with("parse:"));
            assert!(error.contains("not json at all"));
        }
        other => panic!("unexpected poll outcome: {other:?}"),
    }
    assert_eq!(setup.store.put_count(), 0);
    assert!(work_dir_is_empty(&setup));
}

#[tokio::test]
async fn test_download_failure() {
    let setup = setup("exit 0").await;
    let source = format!("{}/missing.wav", setup.server.uri());

    let (key, status) = run_to_end(&setup, &source).await;

    assert_eq!(status, JobStatus::Error);
    let detail = setup
        .pipeline
        .registry()
        .get(&key)
        .unwrap()
        .error_detail
        .unwrap();
    assert!(detail.starts_with("download:"));
    assert!(work_dir_is_empty(&setup));
}

//! Shared fixtures for the API integration tests.
//!
//! The app under test runs with the real router, job queue and orchestrator;
//! only the database is swapped for the in-memory repository and the analyzer
//! for small shell scripts.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use matchcut_api::setup::routes::setup_routes;
use matchcut_api::state::AppState;
use matchcut_api::VideoJobQueue;
use matchcut_core::{Config, StorageBackend};
use matchcut_db::test_helpers::InMemoryVideoRepository;
use matchcut_db::VideoRepository;
use matchcut_processing::{VideoOrchestrator, VideoOrchestratorConfig};
use matchcut_storage::{LocalStorage, Storage};
use serde_json::Value;
use tempfile::TempDir;
use uuid::Uuid;

pub struct TestAppOptions {
    /// Shell script body to install as the analyzer; `None` uses /bin/cp,
    /// which copies the input to the output and prints nothing.
    pub analyzer_script: Option<&'static str>,
    pub analyzer_timeout_secs: u64,
    pub queue_size: usize,
    pub worker_concurrency: usize,
    pub max_video_size_bytes: usize,
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            analyzer_script: None,
            analyzer_timeout_secs: 10,
            queue_size: 32,
            worker_concurrency: 4,
            max_video_size_bytes: 50 * 1024 * 1024,
        }
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub staging: PathBuf,
    pub media_root: PathBuf,
    pub dir: TempDir,
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestAppOptions::default()).await
}

pub async fn setup_test_app_with(options: TestAppOptions) -> TestApp {
    let dir = TempDir::new().unwrap();
    let staging = dir.path().join("staging");
    let processed = dir.path().join("processed");
    let media_root = dir.path().join("media");
    std::fs::create_dir_all(&staging).unwrap();
    std::fs::create_dir_all(&processed).unwrap();
    std::fs::create_dir_all(&media_root).unwrap();

    let analyzer_path = match options.analyzer_script {
        Some(body) => write_analyzer_script(dir.path(), body),
        None => PathBuf::from("/bin/cp"),
    };

    let config = Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        database_url: "postgres://localhost/unused".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 1,
        upload_dir: staging.to_string_lossy().into_owned(),
        processed_dir: processed.to_string_lossy().into_owned(),
        storage_backend: StorageBackend::Local,
        media_root: media_root.to_string_lossy().into_owned(),
        public_base_url: String::new(),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        analyzer_path: analyzer_path.to_string_lossy().into_owned(),
        analyzer_timeout_secs: options.analyzer_timeout_secs,
        analyzer_capture_limit_bytes: 64 * 1024,
        max_video_size_bytes: options.max_video_size_bytes,
        video_queue_size: options.queue_size,
        video_worker_concurrency: options.worker_concurrency,
    };

    let videos: Arc<dyn VideoRepository> = Arc::new(InMemoryVideoRepository::default());
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(media_root.clone(), String::new())
            .await
            .unwrap(),
    );

    let orchestrator = Arc::new(VideoOrchestrator::new(
        storage.clone(),
        VideoOrchestratorConfig {
            staging_dir: staging.clone(),
            processed_dir: processed.clone(),
            analyzer_path,
            analyzer_timeout: Duration::from_secs(options.analyzer_timeout_secs),
            capture_limit_bytes: config.analyzer_capture_limit_bytes,
        },
    ));

    let video_job_queue = VideoJobQueue::new(
        videos.clone(),
        orchestrator.clone(),
        options.queue_size,
        options.worker_concurrency,
    );

    let state = AppState {
        is_production: false,
        videos,
        storage,
        orchestrator,
        video_job_queue,
        config,
    };

    let app = setup_routes(state.clone()).await.unwrap();
    let server = TestServer::new(app.into_make_service()).unwrap();

    TestApp {
        server,
        state,
        staging,
        media_root,
        dir,
    }
}

pub fn write_analyzer_script(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("analyzer.sh");
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

pub fn video_form(field: &str, file_name: &str, bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        field.to_string(),
        Part::bytes(bytes).file_name(file_name).mime_type("video/mp4"),
    )
}

/// Upload a video through the API and return its staged file name.
pub async fn upload_clip(app: &TestApp, file_name: &str, bytes: &[u8]) -> String {
    let res = app
        .server
        .post("/api/upload-video")
        .multipart(video_form("video", file_name, bytes.to_vec()))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    body["fileName"].as_str().unwrap().to_string()
}

/// Register a staged upload as a video record and return the record JSON.
pub async fn create_record(app: &TestApp, user_id: Uuid, staged_name: &str) -> Value {
    let res = app
        .server
        .post("/api/videos")
        .json(&serde_json::json!({ "userId": user_id, "fileName": staged_name }))
        .await;
    res.assert_status(axum::http::StatusCode::CREATED);
    res.json()
}

/// Poll the record endpoint until it reaches the wanted status.
pub async fn poll_video_until(app: &TestApp, id: &str, target: &str) -> Value {
    for _ in 0..50 {
        let res = app.server.get(&format!("/api/videos/{}", id)).await;
        res.assert_status_ok();
        let body: Value = res.json();
        if body["status"] == target {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("video {} never reached status {}", id, target);
}

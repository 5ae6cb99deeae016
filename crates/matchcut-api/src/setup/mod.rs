//! Application wiring: configuration, telemetry, database, storage, and the
//! router itself.

pub mod database;
pub mod routes;
pub mod server;
pub mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use matchcut_core::Config;
use matchcut_db::{PgVideoRepository, VideoRepository};
use matchcut_processing::{VideoOrchestrator, VideoOrchestratorConfig};
use matchcut_storage::create_storage;

use crate::job_queue::VideoJobQueue;
use crate::state::AppState;

pub async fn initialize_app(config: Config) -> Result<Router, anyhow::Error> {
    telemetry::init_telemetry();

    let pool = database::setup_database(&config).await?;
    let videos: Arc<dyn VideoRepository> = Arc::new(PgVideoRepository::new(pool));

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize the storage backend")?;

    let orchestrator = Arc::new(VideoOrchestrator::new(
        storage.clone(),
        VideoOrchestratorConfig {
            staging_dir: PathBuf::from(&config.upload_dir),
            processed_dir: PathBuf::from(&config.processed_dir),
            analyzer_path: PathBuf::from(&config.analyzer_path),
            analyzer_timeout: Duration::from_secs(config.analyzer_timeout_secs),
            capture_limit_bytes: config.analyzer_capture_limit_bytes,
        },
    ));

    let video_job_queue = VideoJobQueue::new(
        videos.clone(),
        orchestrator.clone(),
        config.video_queue_size,
        config.video_worker_concurrency,
    );

    let is_production = config.is_production();
    let state = AppState {
        videos,
        storage,
        orchestrator,
        video_job_queue,
        is_production,
        config,
    };

    routes::setup_routes(state).await
}

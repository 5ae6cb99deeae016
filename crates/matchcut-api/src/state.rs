//! Application state shared by handlers and the background worker.

use std::sync::Arc;

use matchcut_core::Config;
use matchcut_db::VideoRepository;
use matchcut_processing::VideoOrchestrator;
use matchcut_storage::Storage;

use crate::job_queue::VideoJobQueue;

/// Main application state, injected into handlers via `State<Arc<AppState>>`.
///
/// Repositories and storage are held as trait objects so integration tests
/// can swap in in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub is_production: bool,
    pub videos: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn Storage>,
    pub orchestrator: Arc<VideoOrchestrator>,
    pub video_job_queue: VideoJobQueue,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}

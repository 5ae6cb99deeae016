//! Background job queue for video processing
//!
//! Jobs are submitted from request handlers and executed by a bounded worker
//! pool, so the HTTP response returns immediately while the analyzer runs.

use std::sync::Arc;
use std::time::Instant;

use matchcut_core::models::ProcessingStatus;
use matchcut_core::AppError;
use matchcut_db::VideoRepository;
use matchcut_processing::VideoOrchestrator;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

/// Background job types
#[derive(Debug)]
pub enum VideoJob {
    /// Run the analyzer for an existing video record and store the result
    ProcessVideo { video_id: Uuid },
}

/// Handle for submitting jobs to the background worker pool.
///
/// Submission is non-blocking: when the queue is full the job is rejected
/// with `AppError::QueueFull` instead of backpressuring the request.
pub struct VideoJobQueue {
    sender: mpsc::Sender<VideoJob>,
}

impl Clone for VideoJobQueue {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl VideoJobQueue {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        orchestrator: Arc<VideoOrchestrator>,
        queue_size: usize,
        max_concurrent: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_size);
        tokio::spawn(worker_pool(receiver, videos, orchestrator, max_concurrent));
        tracing::info!(queue_size, max_concurrent, "Video job queue started");
        Self { sender }
    }

    pub fn submit(&self, job: VideoJob) -> Result<(), AppError> {
        self.sender.try_send(job).map_err(|err| match err {
            mpsc::error::TrySendError::Full(job) => {
                tracing::warn!(?job, "Video job queue is full, rejecting job");
                AppError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => {
                AppError::Internal("Video job queue is closed".to_string())
            }
        })
    }
}

async fn worker_pool(
    mut receiver: mpsc::Receiver<VideoJob>,
    videos: Arc<dyn VideoRepository>,
    orchestrator: Arc<VideoOrchestrator>,
    max_concurrent: usize,
) {
    let semaphore = Arc::new(Semaphore::new(max_concurrent));

    while let Some(job) = receiver.recv().await {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let videos = videos.clone();
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            if let Err(err) = process_job(job, videos, orchestrator).await {
                tracing::error!(error = %err, "Job processing failed");
            }
            drop(permit);
        });
    }

    tracing::info!("Video job queue shut down");
}

async fn process_job(
    job: VideoJob,
    videos: Arc<dyn VideoRepository>,
    orchestrator: Arc<VideoOrchestrator>,
) -> anyhow::Result<()> {
    match job {
        VideoJob::ProcessVideo { video_id } => {
            process_video_job(video_id, videos, orchestrator).await
        }
    }
}

#[tracing::instrument(skip(videos, orchestrator), fields(job.status = tracing::field::Empty))]
async fn process_video_job(
    video_id: Uuid,
    videos: Arc<dyn VideoRepository>,
    orchestrator: Arc<VideoOrchestrator>,
) -> anyhow::Result<()> {
    let started = Instant::now();

    let record = videos
        .get(video_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Video record {} not found", video_id))?;

    match orchestrator.process(&record.file_name).await {
        Ok(processed) => {
            if videos
                .complete(video_id, &processed.video_url)
                .await?
                .is_none()
            {
                tracing::warn!("Video record disappeared before its result could be stored");
            }
            tracing::Span::current().record("job.status", "success");
            tracing::info!(
                duration_ms = started.elapsed().as_millis() as u64,
                video_url = %processed.video_url,
                "Video processing job completed"
            );
            Ok(())
        }
        Err(err) => {
            tracing::Span::current().record("job.status", "failed");
            tracing::error!(
                error = %err,
                duration_ms = started.elapsed().as_millis() as u64,
                "Video processing job failed"
            );
            if let Err(db_err) = videos.set_status(video_id, ProcessingStatus::Failed).await {
                tracing::error!(error = %db_err, "Failed to mark video record as failed");
            }
            Err(err.into())
        }
    }
}

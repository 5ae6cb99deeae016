//! Video processing orchestration
//!
//! Ties the pieces together for one processing run: locate the staged input,
//! hold the per-video in-flight slot, invoke the analyzer, then publish the
//! produced file through the storage backend.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use matchcut_core::AppError;
use matchcut_storage::{keys, Storage};

use crate::guard::InFlightGuard;
use crate::invoker::{AnalyzerError, AnalyzerInvoker};

/// Output naming convention: `output_<inputFileName>`.
///
/// The same name is used for the analyzer's output path, the storage key under
/// `output_videos/` and the public URL path segment.
pub fn output_file_name(input_file_name: &str) -> String {
    format!("output_{}", input_file_name)
}

/// Result of one successful processing run
#[derive(Debug, Clone)]
pub struct ProcessedVideo {
    pub output_file_name: String,
    /// Public URL of the published output file
    pub video_url: String,
    /// Analyzer stdout, surfaced to the caller as informational text
    pub message: String,
}

/// Filesystem layout and analyzer settings for the orchestrator
#[derive(Debug, Clone)]
pub struct VideoOrchestratorConfig {
    /// Directory holding raw uploads, keyed by staged file name
    pub staging_dir: PathBuf,
    /// Internal directory the analyzer writes into before publication
    pub processed_dir: PathBuf,
    pub analyzer_path: PathBuf,
    pub analyzer_timeout: Duration,
    pub capture_limit_bytes: usize,
}

/// Runs the full pipeline for a staged video.
///
/// At most one run per input file name is in flight at a time; concurrent
/// duplicates are rejected with [`AppError::AlreadyProcessing`]. Repeated
/// sequential runs for the same name overwrite the previously published file.
#[derive(Clone)]
pub struct VideoOrchestrator {
    invoker: AnalyzerInvoker,
    storage: Arc<dyn Storage>,
    staging_dir: PathBuf,
    processed_dir: PathBuf,
    in_flight: InFlightGuard,
}

impl VideoOrchestrator {
    pub fn new(storage: Arc<dyn Storage>, config: VideoOrchestratorConfig) -> Self {
        Self {
            invoker: AnalyzerInvoker::new(
                config.analyzer_path,
                config.analyzer_timeout,
                config.capture_limit_bytes,
            ),
            storage,
            staging_dir: config.staging_dir,
            processed_dir: config.processed_dir,
            in_flight: InFlightGuard::default(),
        }
    }

    /// Process a previously staged upload and publish the analyzer's output.
    ///
    /// The internal copy under the processed directory is retained; only the
    /// published copy is publicly reachable.
    #[tracing::instrument(skip(self))]
    pub async fn process(&self, file_name: &str) -> Result<ProcessedVideo, AppError> {
        validate_input_name(file_name)?;

        let input_path = self.staging_dir.join(file_name);
        if !tokio::fs::try_exists(&input_path).await? {
            return Err(AppError::NotFound(format!(
                "No uploaded video named {}",
                file_name
            )));
        }

        // Held until this function returns, releasing the name on any path.
        let _slot = self
            .in_flight
            .try_acquire(file_name)
            .ok_or_else(|| AppError::AlreadyProcessing(file_name.to_string()))?;

        tokio::fs::create_dir_all(&self.processed_dir).await?;

        let output_name = output_file_name(file_name);
        let output_path = self.processed_dir.join(&output_name);

        let output = match self.invoker.run(&input_path, &output_path).await {
            Ok(output) => output,
            Err(AnalyzerError::NonZeroExit { stderr, .. }) => {
                return Err(AppError::AnalyzerFailed { stderr });
            }
            Err(AnalyzerError::TimedOut { seconds }) => {
                return Err(AppError::AnalyzerTimeout { seconds });
            }
            Err(e) => {
                return Err(AppError::InternalWithSource {
                    message: "Analyzer invocation failed".to_string(),
                    source: e.into(),
                });
            }
        };

        let bytes = tokio::fs::read(&output_path).await.map_err(|e| {
            AppError::Internal(format!(
                "Analyzer exited cleanly but produced no readable output: {}",
                e
            ))
        })?;

        let storage_key = keys::output_video_key(&output_name);
        let video_url = self
            .storage
            .upload(&storage_key, bytes, "video/mp4")
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        tracing::info!(
            file_name = %file_name,
            video_url = %video_url,
            "Video processing completed"
        );

        Ok(ProcessedVideo {
            output_file_name: output_name,
            video_url,
            message: output.stdout,
        })
    }
}

fn validate_input_name(file_name: &str) -> Result<(), AppError> {
    if file_name.is_empty() {
        return Err(AppError::InvalidInput(
            "File name cannot be empty".to_string(),
        ));
    }
    if file_name.contains("..") || file_name.contains('/') || file_name.contains('\\') {
        return Err(AppError::InvalidInput(format!(
            "Invalid video file name: {}",
            file_name
        )));
    }
    Ok(())
}

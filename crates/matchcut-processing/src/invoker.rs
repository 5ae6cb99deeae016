//! Analyzer process invocation

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::capture::{read_capped, CapturedStream};

/// Failure modes of a single analyzer run
///
/// A deadline expiry is deliberately distinct from a non-zero exit so callers
/// can map the two to different HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("failed to start analyzer {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed reading analyzer output: {0}")]
    Io(#[from] std::io::Error),

    #[error("analyzer exited with status {code:?}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("analyzer did not finish within {seconds}s")]
    TimedOut { seconds: u64 },
}

/// Captured output of a successful run
#[derive(Debug)]
pub struct AnalyzerOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Spawns the external analyzer as `program <input> <output>`.
///
/// Stdout and stderr are piped and captured up to `capture_limit` bytes each;
/// the whole run races a wall-clock deadline, after which the child is killed
/// and reaped.
#[derive(Clone)]
pub struct AnalyzerInvoker {
    program: PathBuf,
    timeout: Duration,
    capture_limit: usize,
}

impl AnalyzerInvoker {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration, capture_limit: usize) -> Self {
        Self {
            program: program.into(),
            timeout,
            capture_limit,
        }
    }

    #[tracing::instrument(skip_all, fields(
        process.executable.path = %self.program.display(),
        input = %input_path.display(),
        output = %output_path.display(),
    ))]
    pub async fn run(
        &self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<AnalyzerOutput, AnalyzerError> {
        let start = std::time::Instant::now();

        let mut child = Command::new(&self.program)
            .arg(input_path)
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AnalyzerError::Spawn {
                program: self.program.display().to_string(),
                source: e,
            })?;

        let stdout_pipe = child.stdout.take().ok_or_else(|| {
            AnalyzerError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "child stdout was not piped",
            ))
        })?;
        let stderr_pipe = child.stderr.take().ok_or_else(|| {
            AnalyzerError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "child stderr was not piped",
            ))
        })?;

        // Readers run while we wait so the child cannot block on a full pipe.
        let stdout_task = tokio::spawn(read_capped(stdout_pipe, self.capture_limit));
        let stderr_task = tokio::spawn(read_capped(stderr_pipe, self.capture_limit));

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(waited) => waited?,
            Err(_) => {
                if let Err(e) = child.start_kill() {
                    tracing::warn!(error = %e, "Failed to kill analyzer after deadline");
                }
                let _ = child.wait().await;

                if let Ok(Ok(stderr)) = stderr_task.await {
                    tracing::warn!(
                        stderr = %stderr.into_text(),
                        timeout_secs = self.timeout.as_secs(),
                        "Analyzer killed after deadline"
                    );
                }

                return Err(AnalyzerError::TimedOut {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let stdout = join_capture(stdout_task).await?.into_text();
        let stderr = join_capture(stderr_task).await?.into_text();

        if !status.success() {
            tracing::error!(
                exit_code = ?status.code(),
                stderr = %stderr,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Analyzer run failed"
            );
            return Err(AnalyzerError::NonZeroExit {
                code: status.code(),
                stderr,
            });
        }

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Analyzer run completed"
        );

        Ok(AnalyzerOutput { stdout, stderr })
    }
}

async fn join_capture(
    task: JoinHandle<std::io::Result<CapturedStream>>,
) -> Result<CapturedStream, AnalyzerError> {
    match task.await {
        Ok(result) => Ok(result?),
        Err(e) => Err(AnalyzerError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            e,
        ))),
    }
}

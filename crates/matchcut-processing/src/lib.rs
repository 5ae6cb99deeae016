//! Video analysis pipeline
//!
//! Runs the external analyzer binary over staged uploads and publishes its
//! output through the storage layer: resolve the staged input, spawn
//! `analyzer <input> <output>`, capture bounded stdout/stderr under a
//! deadline, then upload the produced file under `output_videos/`.

mod capture;
pub mod guard;
pub mod invoker;
pub mod orchestrator;

pub use guard::InFlightGuard;
pub use invoker::{AnalyzerError, AnalyzerInvoker, AnalyzerOutput};
pub use orchestrator::{output_file_name, ProcessedVideo, VideoOrchestrator, VideoOrchestratorConfig};

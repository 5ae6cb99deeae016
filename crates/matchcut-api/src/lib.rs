//! Matchcut API library
//!
//! Exposes the handlers, router assembly and shared state so integration
//! tests can drive the full application without binding a socket.

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod job_queue;
pub mod setup;
pub mod state;
pub mod utils;

pub use job_queue::{VideoJob, VideoJobQueue};
pub use state::AppState;

//! Persistence layer for video records.
//!
//! `VideoRepository` is the seam between HTTP handlers / the processing worker
//! and Postgres; `test_helpers` carries an in-memory implementation so callers
//! can be tested without a database.

pub mod test_helpers;
pub mod videos;

pub use videos::{PgVideoRepository, VideoRepository};

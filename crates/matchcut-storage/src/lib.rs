//! Matchcut Storage Library
//!
//! This crate provides the blob-store abstraction and implementations for
//! matchcut. It includes the Storage trait plus local filesystem and S3
//! backends.
//!
//! # Storage key format
//!
//! All backends use the same key layout for consistency:
//!
//! - **Raw uploads**: `raw/{file_name}`
//! - **Published analyzer outputs**: `output_videos/{file_name}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use matchcut_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};

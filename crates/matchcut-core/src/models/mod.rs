//! Data models for the application
//!
//! This module contains the data structures used throughout the application.

mod video;

// Re-export all models for convenient imports
pub use video::*;

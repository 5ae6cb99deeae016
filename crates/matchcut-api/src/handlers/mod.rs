//! HTTP request handlers

pub mod run_model;
pub mod upload_video;
pub mod videos;

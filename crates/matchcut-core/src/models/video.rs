use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a video record: `created` until processing is triggered,
/// `processing` while an analyzer run is in flight, then `completed` or
/// `failed`. There is no cancelled state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, sqlx::Type)]
#[sqlx(type_name = "processing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Created,
    Processing,
    Completed,
    Failed,
}

impl Display for ProcessingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProcessingStatus::Created => write!(f, "created"),
            ProcessingStatus::Processing => write!(f, "processing"),
            ProcessingStatus::Completed => write!(f, "completed"),
            ProcessingStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One uploaded piece of footage and its processing state.
///
/// `original_url` is set once at creation and never changes. `processed_url`
/// stays null until an analyzer run completes; a later re-run overwrites it
/// (last-write-wins, no versioning).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub original_url: String,
    pub processed_url: Option<String>,
    pub status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing shape of a video record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecordResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub original_url: String,
    pub processed_url: Option<String>,
    pub status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VideoRecord> for VideoRecordResponse {
    fn from(record: VideoRecord) -> Self {
        VideoRecordResponse {
            id: record.id,
            user_id: record.user_id,
            file_name: record.file_name,
            original_url: record.original_url,
            processed_url: record.processed_url,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record() -> VideoRecord {
        VideoRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            file_name: "video_1700000000000_clip.mp4".to_string(),
            original_url: "/raw/video_1700000000000_clip.mp4".to_string(),
            processed_url: None,
            status: ProcessingStatus::Created,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_processing_status_display() {
        assert_eq!(ProcessingStatus::Created.to_string(), "created");
        assert_eq!(ProcessingStatus::Processing.to_string(), "processing");
        assert_eq!(ProcessingStatus::Completed.to_string(), "completed");
        assert_eq!(ProcessingStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_processing_status_serializes_lowercase() {
        let value = serde_json::to_value(ProcessingStatus::Processing).unwrap();
        assert_eq!(value, serde_json::json!("processing"));
    }

    #[test]
    fn test_response_uses_camel_case_keys() {
        let record = test_record();
        let response = VideoRecordResponse::from(record.clone());
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["userId"], serde_json::json!(record.user_id));
        assert_eq!(value["fileName"], serde_json::json!(record.file_name));
        assert_eq!(value["originalUrl"], serde_json::json!(record.original_url));
        // Null until a run completes, but the key must be present for pollers.
        assert!(value.as_object().unwrap().contains_key("processedUrl"));
        assert_eq!(value["processedUrl"], serde_json::Value::Null);
        assert_eq!(value["status"], serde_json::json!("created"));
    }

    #[test]
    fn test_response_carries_processed_url_after_completion() {
        let mut record = test_record();
        record.status = ProcessingStatus::Completed;
        record.processed_url =
            Some("/output_videos/output_video_1700000000000_clip.mp4".to_string());

        let response = VideoRecordResponse::from(record);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value["processedUrl"],
            serde_json::json!("/output_videos/output_video_1700000000000_clip.mp4")
        );
        assert_eq!(value["status"], serde_json::json!("completed"));
    }
}

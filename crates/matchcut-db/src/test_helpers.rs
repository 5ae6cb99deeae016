//! In-memory repository for testing without a database
//!
//! Behavior mirrors `PgVideoRepository`, including the conditional
//! `begin_processing` transition that API tests depend on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use matchcut_core::models::{ProcessingStatus, VideoRecord};
use matchcut_core::AppError;
use uuid::Uuid;

use crate::videos::VideoRepository;

/// In-memory video repository
#[derive(Clone, Default)]
pub struct InMemoryVideoRepository {
    records: Arc<Mutex<HashMap<Uuid, VideoRecord>>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create(
        &self,
        user_id: Uuid,
        file_name: &str,
        original_url: &str,
    ) -> Result<VideoRecord, AppError> {
        let now = Utc::now();
        let record = VideoRecord {
            id: Uuid::new_v4(),
            user_id,
            file_name: file_name.to_string(),
            original_url: original_url.to_string(),
            processed_url: None,
            status: ProcessingStatus::Created,
            created_at: now,
            updated_at: now,
        };

        self.records
            .lock()
            .unwrap()
            .insert(record.id, record.clone());

        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self, user_id: Option<Uuid>) -> Result<Vec<VideoRecord>, AppError> {
        let records = self.records.lock().unwrap();
        let mut out: Vec<VideoRecord> = records
            .values()
            .filter(|r| user_id.map_or(true, |uid| r.user_id == uid))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn begin_processing(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&id) {
            Some(record) if record.status != ProcessingStatus::Processing => {
                record.status = ProcessingStatus::Processing;
                record.updated_at = Utc::now();
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn complete(
        &self,
        id: Uuid,
        processed_url: &str,
    ) -> Result<Option<VideoRecord>, AppError> {
        let mut records = self.records.lock().unwrap();
        Ok(records.get_mut(&id).map(|record| {
            record.status = ProcessingStatus::Completed;
            record.processed_url = Some(processed_url.to_string());
            record.updated_at = Utc::now();
            record.clone()
        }))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ProcessingStatus,
    ) -> Result<Option<VideoRecord>, AppError> {
        let mut records = self.records.lock().unwrap();
        Ok(records.get_mut(&id).map(|record| {
            record.status = status;
            record.updated_at = Utc::now();
            record.clone()
        }))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_starts_in_created_status() {
        let repo = InMemoryVideoRepository::new();
        let record = repo
            .create(Uuid::new_v4(), "video_1_clip.mp4", "/raw/video_1_clip.mp4")
            .await
            .unwrap();

        assert_eq!(record.status, ProcessingStatus::Created);
        assert!(record.processed_url.is_none());

        let fetched = repo.get(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.file_name, "video_1_clip.mp4");
    }

    #[tokio::test]
    async fn test_begin_processing_rejects_duplicate_transition() {
        let repo = InMemoryVideoRepository::new();
        let record = repo
            .create(Uuid::new_v4(), "video_1_clip.mp4", "/raw/video_1_clip.mp4")
            .await
            .unwrap();

        let first = repo.begin_processing(record.id).await.unwrap();
        assert_eq!(first.unwrap().status, ProcessingStatus::Processing);

        let second = repo.begin_processing(record.id).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_begin_processing_allowed_again_after_completion() {
        let repo = InMemoryVideoRepository::new();
        let record = repo
            .create(Uuid::new_v4(), "video_1_clip.mp4", "/raw/video_1_clip.mp4")
            .await
            .unwrap();

        repo.begin_processing(record.id).await.unwrap();
        let completed = repo
            .complete(record.id, "/output_videos/output_video_1_clip.mp4")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(completed.status, ProcessingStatus::Completed);
        assert_eq!(
            completed.processed_url.as_deref(),
            Some("/output_videos/output_video_1_clip.mp4")
        );

        let again = repo.begin_processing(record.id).await.unwrap();
        assert!(again.is_some());
    }

    #[tokio::test]
    async fn test_complete_overwrites_previous_result() {
        let repo = InMemoryVideoRepository::new();
        let record = repo
            .create(Uuid::new_v4(), "video_1_clip.mp4", "/raw/video_1_clip.mp4")
            .await
            .unwrap();

        repo.complete(record.id, "/output_videos/a.mp4").await.unwrap();
        let second = repo
            .complete(record.id, "/output_videos/b.mp4")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(second.processed_url.as_deref(), Some("/output_videos/b.mp4"));
    }

    #[tokio::test]
    async fn test_list_filters_by_user_newest_first() {
        let repo = InMemoryVideoRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        repo.create(alice, "video_1_a.mp4", "/raw/video_1_a.mp4")
            .await
            .unwrap();
        repo.create(bob, "video_2_b.mp4", "/raw/video_2_b.mp4")
            .await
            .unwrap();
        repo.create(alice, "video_3_c.mp4", "/raw/video_3_c.mp4")
            .await
            .unwrap();

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].created_at >= all[1].created_at);

        let alices = repo.list(Some(alice)).await.unwrap();
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|r| r.user_id == alice));
    }

    #[tokio::test]
    async fn test_set_status_marks_failed() {
        let repo = InMemoryVideoRepository::new();
        let record = repo
            .create(Uuid::new_v4(), "video_1_clip.mp4", "/raw/video_1_clip.mp4")
            .await
            .unwrap();

        repo.begin_processing(record.id).await.unwrap();
        let failed = repo
            .set_status(record.id, ProcessingStatus::Failed)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(failed.status, ProcessingStatus::Failed);
        assert!(failed.processed_url.is_none());
    }
}

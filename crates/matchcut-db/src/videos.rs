use async_trait::async_trait;
use chrono::Utc;
use matchcut_core::models::{ProcessingStatus, VideoRecord};
use matchcut_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Persistence operations for video records
///
/// HTTP handlers and the processing worker depend on this trait rather than a
/// concrete pool so tests can substitute an in-memory implementation.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Insert a new record in `created` status.
    async fn create(
        &self,
        user_id: Uuid,
        file_name: &str,
        original_url: &str,
    ) -> Result<VideoRecord, AppError>;

    /// Fetch a record by id.
    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    /// List records, newest first, optionally filtered by owner.
    async fn list(&self, user_id: Option<Uuid>) -> Result<Vec<VideoRecord>, AppError>;

    /// Transition a record into `processing`.
    ///
    /// The update is conditional on the record not already being in
    /// `processing`, so concurrent duplicate triggers get `None` back.
    async fn begin_processing(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    /// Mark a record `completed` and set its processed URL.
    ///
    /// Unconditional update: a sequential re-run overwrites the previous
    /// result (last write wins).
    async fn complete(&self, id: Uuid, processed_url: &str)
        -> Result<Option<VideoRecord>, AppError>;

    /// Overwrite a record's status (used for `failed` and for reverting a
    /// transition that could not be followed through).
    async fn set_status(
        &self,
        id: Uuid,
        status: ProcessingStatus,
    ) -> Result<Option<VideoRecord>, AppError>;

    /// Round-trip to the backing store, for readiness probes.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Postgres-backed video repository
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "insert"))]
    async fn create(
        &self,
        user_id: Uuid,
        file_name: &str,
        original_url: &str,
    ) -> Result<VideoRecord, AppError> {
        let now = Utc::now();

        let record: VideoRecord = sqlx::query_as::<Postgres, VideoRecord>(
            r#"
            INSERT INTO videos (id, user_id, file_name, original_url, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(file_name)
        .bind(original_url)
        .bind(ProcessingStatus::Created)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, VideoRecord>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list(&self, user_id: Option<Uuid>) -> Result<Vec<VideoRecord>, AppError> {
        let records = match user_id {
            None => {
                sqlx::query_as::<Postgres, VideoRecord>(
                    "SELECT * FROM videos ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
            Some(uid) => {
                sqlx::query_as::<Postgres, VideoRecord>(
                    "SELECT * FROM videos WHERE user_id = $1 ORDER BY created_at DESC",
                )
                .bind(uid)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn begin_processing(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, VideoRecord>(
            r#"
            UPDATE videos
            SET status = $2, updated_at = $3
            WHERE id = $1 AND status <> $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ProcessingStatus::Processing)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn complete(
        &self,
        id: Uuid,
        processed_url: &str,
    ) -> Result<Option<VideoRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, VideoRecord>(
            r#"
            UPDATE videos
            SET status = $2, processed_url = $3, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ProcessingStatus::Completed)
        .bind(processed_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_status(
        &self,
        id: Uuid,
        status: ProcessingStatus,
    ) -> Result<Option<VideoRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, VideoRecord>(
            r#"
            UPDATE videos
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

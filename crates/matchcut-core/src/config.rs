//! Configuration module
//!
//! Environment-driven configuration for the HTTP server, database, storage
//! paths, and analyzer invocation. Values are read once at startup and the
//! resulting `Config` is passed into components explicitly.

use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_VIDEO_SIZE_MB: usize = 500;
const ANALYZER_TIMEOUT_SECS: u64 = 300;
const ANALYZER_CAPTURE_LIMIT_BYTES: usize = 256 * 1024;
const VIDEO_QUEUE_SIZE: usize = 100;
const VIDEO_WORKER_CONCURRENCY: usize = 2;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    // Database configuration
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Pipeline directories
    pub upload_dir: String,
    pub processed_dir: String,
    // Blob store configuration
    pub storage_backend: StorageBackend,
    pub media_root: String,
    pub public_base_url: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    // Analyzer invocation
    pub analyzer_path: String,
    pub analyzer_timeout_secs: u64,
    pub analyzer_capture_limit_bytes: usize,
    // Upload limits and background processing
    pub max_video_size_bytes: usize,
    pub video_queue_size: usize,
    pub video_worker_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(StorageBackend::Local);

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            processed_dir: env::var("PROCESSED_DIR")
                .unwrap_or_else(|_| "processed_videos".to_string()),
            storage_backend,
            media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL").unwrap_or_default(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            analyzer_path: env::var("ANALYZER_PATH").unwrap_or_else(|_| "analyzer".to_string()),
            analyzer_timeout_secs: env::var("ANALYZER_TIMEOUT_SECS")
                .unwrap_or_else(|_| ANALYZER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(ANALYZER_TIMEOUT_SECS),
            analyzer_capture_limit_bytes: env::var("ANALYZER_CAPTURE_LIMIT_BYTES")
                .unwrap_or_else(|_| ANALYZER_CAPTURE_LIMIT_BYTES.to_string())
                .parse()
                .unwrap_or(ANALYZER_CAPTURE_LIMIT_BYTES),
            max_video_size_bytes: env::var("MAX_VIDEO_SIZE_MB")
                .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_VIDEO_SIZE_MB)
                * 1024
                * 1024,
            video_queue_size: env::var("VIDEO_QUEUE_SIZE")
                .unwrap_or_else(|_| VIDEO_QUEUE_SIZE.to_string())
                .parse()
                .unwrap_or(VIDEO_QUEUE_SIZE),
            video_worker_concurrency: env::var("VIDEO_WORKER_CONCURRENCY")
                .unwrap_or_else(|_| VIDEO_WORKER_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(VIDEO_WORKER_CONCURRENCY),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.analyzer_path.trim().is_empty() {
            return Err(anyhow::anyhow!("ANALYZER_PATH cannot be empty"));
        }

        // The analyzer path ends up in a process spawn; shell metacharacters
        // in it are always a configuration mistake.
        let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
        if self
            .analyzer_path
            .chars()
            .any(|c| dangerous_chars.contains(&c))
        {
            return Err(anyhow::anyhow!(
                "ANALYZER_PATH contains dangerous characters: {}",
                self.analyzer_path
            ));
        }
        if self.analyzer_path.contains("..") {
            return Err(anyhow::anyhow!(
                "ANALYZER_PATH contains directory traversal: {}",
                self.analyzer_path
            ));
        }

        if self.analyzer_timeout_secs == 0 {
            return Err(anyhow::anyhow!("ANALYZER_TIMEOUT_SECS must be at least 1"));
        }

        if self.video_worker_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "VIDEO_WORKER_CONCURRENCY must be at least 1"
            ));
        }

        if self.upload_dir.trim().is_empty() || self.processed_dir.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "UPLOAD_DIR and PROCESSED_DIR cannot be empty"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.media_root.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "MEDIA_ROOT cannot be empty when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 4000,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            database_url: "postgresql://localhost/matchcut".to_string(),
            db_max_connections: 20,
            db_timeout_seconds: 30,
            upload_dir: "uploads".to_string(),
            processed_dir: "processed_videos".to_string(),
            storage_backend: StorageBackend::Local,
            media_root: "media".to_string(),
            public_base_url: String::new(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            analyzer_path: "analyzer".to_string(),
            analyzer_timeout_secs: 300,
            analyzer_capture_limit_bytes: 256 * 1024,
            max_video_size_bytes: 500 * 1024 * 1024,
            video_queue_size: 100,
            video_worker_concurrency: 2,
        }
    }

    #[test]
    fn test_valid_config_passes_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_postgres_database_url() {
        let mut config = base_config();
        config.database_url = "mysql://localhost/matchcut".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_accepts_postgres_scheme_alias() {
        let mut config = base_config();
        config.database_url = "postgres://localhost/matchcut".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_analyzer_timeout() {
        let mut config = base_config();
        config.analyzer_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_analyzer_path_with_shell_metacharacters() {
        for path in ["analyzer; rm -rf /", "analyzer|tee", "$(evil)", "../analyzer"] {
            let mut config = base_config();
            config.analyzer_path = path.to_string();
            assert!(config.validate().is_err(), "{} should be rejected", path);
        }
    }

    #[test]
    fn test_accepts_plain_analyzer_paths() {
        for path in ["analyzer", "/usr/local/bin/matchcut-analyzer", "./bin/run_model.sh"] {
            let mut config = base_config();
            config.analyzer_path = path.to_string();
            assert!(config.validate().is_ok(), "{} should be accepted", path);
        }
    }

    #[test]
    fn test_s3_backend_requires_bucket_and_region() {
        let mut config = base_config();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.s3_bucket = Some("footage".to_string());
        assert!(config.validate().is_err());

        config.s3_region = Some("eu-west-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_production() {
        let mut config = base_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
        config.environment = "prod".to_string();
        assert!(config.is_production());
    }
}

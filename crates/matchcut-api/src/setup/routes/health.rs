//! Health check endpoints
//!
//! `/live` answers as long as the process is up, `/ready` gates on the
//! database, and `/health` reports per-dependency detail.

use std::future::Future;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::state::AppState;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
}

async fn run_check<F, Fut>(name: &str, check: F) -> (bool, String)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    match tokio::time::timeout(CHECK_TIMEOUT, check()).await {
        Ok(Ok(())) => (true, "ok".to_string()),
        Ok(Err(err)) => {
            tracing::warn!(check = name, error = %err, "Health check failed");
            (false, err)
        }
        Err(_) => {
            tracing::warn!(check = name, "Health check timed out");
            (false, "timed out".to_string())
        }
    }
}

pub async fn liveness() -> impl IntoResponse {
    Json(json!({ "status": "alive" }))
}

pub async fn readiness_check(state: AppState) -> impl IntoResponse {
    let (ready, detail) = run_check("database", || async {
        state.videos.ping().await.map_err(|err| err.to_string())
    })
    .await;

    if ready {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not ready", "database": detail })),
        )
    }
}

pub async fn health_check(state: AppState) -> impl IntoResponse {
    let (database_ok, database) = run_check("database", || async {
        state.videos.ping().await.map_err(|err| err.to_string())
    })
    .await;

    // A miss is fine here, only a backend error means storage is down.
    let (storage_ok, storage) = run_check("storage", || async {
        state
            .storage
            .exists("health-check-non-existent-key")
            .await
            .map(|_| ())
            .map_err(|err| err.to_string())
    })
    .await;

    let healthy = database_ok && storage_ok;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthCheckResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            database,
            storage,
        }),
    )
}

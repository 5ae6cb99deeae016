//! Router assembly: API endpoints, static media mounts, and middleware.

pub mod health;

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use matchcut_core::Config;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa_rapidoc::RapiDoc;

use crate::api_doc;
use crate::handlers;
use crate::state::AppState;

const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// The transport cap sits above the per-file limit so the multipart framing
/// never trips it first; the upload handler owns the 413.
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

pub async fn setup_routes(state: AppState) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(&state.config);

    let concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(DEFAULT_HTTP_CONCURRENCY_LIMIT)
        .max(1);
    tracing::info!(concurrency_limit, "HTTP concurrency limit configured");

    let body_limit = state.config.max_video_size_bytes + BODY_LIMIT_HEADROOM;
    let output_dir = Path::new(&state.config.media_root).join("output_videos");
    let raw_dir = Path::new(&state.config.media_root).join("raw");

    let api_routes = Router::new()
        .route(
            "/api/upload-video",
            post(handlers::upload_video::upload_video),
        )
        .route("/api/run-model", post(handlers::run_model::run_model))
        .route(
            "/api/videos",
            post(handlers::videos::create_video).get(handlers::videos::list_videos),
        )
        .route("/api/videos/{id}", get(handlers::videos::get_video))
        .route(
            "/api/videos/{id}/process",
            post(handlers::videos::process_video),
        )
        .route(
            "/api/openapi.json",
            get(|| async { Json(api_doc::openapi_spec()) }),
        );

    let health_routes = Router::new()
        .route(
            "/health",
            get({
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async move { health::health_check(state).await }
                }
            }),
        )
        .route("/live", get(health::liveness))
        .route(
            "/ready",
            get({
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async move { health::readiness_check(state).await }
                }
            }),
        );

    let app = Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(RapiDoc::new("/api/openapi.json").path("/docs"))
        .nest_service("/output_videos", ServeDir::new(output_dir))
        .nest_service("/raw", ServeDir::new(raw_dir))
        .layer(ConcurrencyLimitLayer::new(concurrency_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    if config.cors_origins.iter().any(|origin| origin == "*") {
        tracing::warn!("CORS is configured to allow any origin");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE])
}

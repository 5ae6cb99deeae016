//! HTTP server startup and graceful shutdown

use anyhow::Context;
use axum::Router;
use matchcut_core::Config;
use tokio::net::TcpListener;

pub async fn start_server(config: &Config, app: Router) -> Result<(), anyhow::Error> {
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        address = %addr,
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        upload_dir = %config.upload_dir,
        processed_dir = %config.processed_dir,
        analyzer_path = %config.analyzer_path,
        analyzer_timeout_secs = config.analyzer_timeout_secs,
        max_video_mb = config.max_video_size_bytes / (1024 * 1024),
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

//! HTTP layer: one route per model.

pub mod error;
pub mod handlers;

use crate::core::service::InferenceService;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// 音訊樣本以 JSON 傳送，體積遠大於 axum 預設上限
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn router(service: InferenceService) -> Router {
    Router::new()
        .route("/predict", get(handlers::predict))
        .route("/check_activity", post(handlers::check_activity))
        .route("/check_audio", post(handlers::check_audio))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

pub async fn serve<C: ConfigProvider>(config: &C, service: InferenceService) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("🚀 Serving on http://{}", listener.local_addr()?);
    if config.debug() {
        tracing::debug!("Debug mode enabled");
    }

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{self, AppState};
use crate::config::TintwaveConfig;
use crate::weather::{OpenWeatherMapClient, WeatherAggregator};

/// Full application router with the endpoint mounted under `/api`.
/// Oversized bodies are rejected by the handler's body extractor so they get
/// the same JSON error reply as any other unreadable request.
pub fn app(state: AppState, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(state))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(cors)
}

pub async fn run(config: TintwaveConfig) -> Result<()> {
    // Fails fast when the provider credential is missing
    let source = OpenWeatherMapClient::new(&config)?;
    let state = AppState::new(WeatherAggregator::new(Arc::new(source)));
    let app = app(state, config.server.body_limit_bytes as usize);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("got SIGINT, shutting down");
}

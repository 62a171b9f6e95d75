// src/api/mod.rs — HTTP surface: REST endpoints plus the SSE event feed

pub mod handlers;
pub mod index;
pub mod types;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::engine::runner::Engine;
use crate::infra::config::ServerConfig;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<Engine>,
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(handlers::index_page))
        .route("/api/v1/runs", post(handlers::start_run))
        .route("/api/v1/runs/{id}", get(handlers::get_run))
        .route("/api/v1/runs/{id}/stop", post(handlers::stop_run))
        .route("/api/v1/runs/{id}/history", get(handlers::get_history))
        .route("/api/v1/runs/{id}/export", get(handlers::export_csv))
        .route("/api/v1/runs/{id}/events", get(handlers::stream_events))
        .route("/api/v1/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Start the API server (runs until the process exits).
pub async fn start_server(config: &ServerConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = build_router(state);

    tracing::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

//! Draft store API server
//!
//! Provides REST endpoints for:
//! - Draft listing and retrieval
//! - Draft saves with bounded version history
//! - Version restore and status transitions
//! - Filled-document download

use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod handlers;
mod models;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("formpilot_api=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing draft store API...");
    let state = AppState::new().await?;
    let state = Arc::new(state);

    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/drafts",
            get(handlers::list_drafts).post(handlers::save_draft),
        )
        .route(
            "/api/drafts/:id",
            get(handlers::get_draft).delete(handlers::delete_draft),
        )
        .route(
            "/api/drafts/:id/versions/:version_id/restore",
            post(handlers::restore_version),
        )
        .route("/api/drafts/:id/status", put(handlers::update_status))
        .route("/api/drafts/:id/document", get(handlers::download_document))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3002);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting draft store API on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

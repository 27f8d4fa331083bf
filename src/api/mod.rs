//! REST API for triggering decision batches.
//!
//! Provides two endpoints:
//! - `GET /health`: liveness probe
//! - `POST /decision`: runs a batch with optional per-request overrides

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::config::DecisionConfig;

pub use types::{DecisionRequest, DecisionResponse, ErrorResponse, FileEntry};

/// Immutable application state shared across all request handlers.
///
/// Requests never mutate the base configuration; overrides are applied to a
/// per-request copy.
pub struct AppState {
    /// Base configuration for every batch.
    pub config: DecisionConfig,
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/decision", post(handlers::run_decision))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}

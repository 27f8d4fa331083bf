//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::warn;

use super::AppState;
use super::types::{DecisionRequest, DecisionResponse, ErrorResponse};
use crate::dispatch::write_decision_csvs;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// `GET /health` → 200 + `{"ok": true}`
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Runs a decision batch and persists its outputs.
///
/// `POST /decision` with an empty body or a JSON object of overrides.
/// → 200 + `DecisionResponse` when at least one file was written
/// → 400 + `ErrorResponse` for malformed bodies and fatal batch failures
pub async fn run_decision(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<DecisionResponse>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        DecisionRequest::default()
    } else {
        serde_json::from_slice::<DecisionRequest>(&body).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("invalid request body: {e}"), Vec::new())),
            )
        })?
    };
    let config = request.apply_to(&state.config);

    let output = tokio::task::spawn_blocking(move || write_decision_csvs(&config))
        .await
        .map_err(|e| {
            warn!(error = %e, "decision task aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("decision task aborted", Vec::new())),
            )
        })?;

    if !output.is_ok() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(output.message(), output.warning_messages())),
        ));
    }
    Ok(Json(DecisionResponse::from(output)))
}

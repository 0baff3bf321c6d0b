use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether a document has been saved yet.
    pub document_saved: bool,
}

/// GET /health -- returns service status and whether a document exists.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let document_saved = tokio::fs::try_exists(state.storage.document_path())
        .await
        .unwrap_or(false);

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        document_saved,
    })
}

/// Mount health check routes (root level, not under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

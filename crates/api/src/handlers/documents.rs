//! Handler for saving the story document.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use storybook_core::error::CoreError;
use storybook_core::protocol::SaveResponse;
use storybook_core::validation::document_from_value;

use crate::error::AppResult;
use crate::state::AppState;

/// POST /api/save-scenes
///
/// Validate the body as a story document and overwrite the saved copy.
/// The body is parsed here rather than by the `Json` extractor so that
/// malformed input gets the same error envelope as every other failure.
pub async fn save_document(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<SaveResponse>> {
    let value: serde_json::Value = serde_json::from_slice(&body).map_err(CoreError::from)?;
    let document = document_from_value(value)?;

    state.storage.save_document(&document).await?;

    Ok(Json(SaveResponse::saved()))
}

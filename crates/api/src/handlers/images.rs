//! Handler for saving inline images as served files.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use storybook_core::error::CoreError;
use storybook_core::media::strip_data_uri_prefix;
use storybook_core::protocol::{SaveBlobRequest, SaveResponse};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/save-image
///
/// Decode `base64Data` (with or without a `data:` header) and write it to
/// `images/{filename}`. Responds with the path the image is served from.
pub async fn save_image(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<SaveResponse>> {
    let request: SaveBlobRequest = serde_json::from_slice(&body).map_err(CoreError::from)?;

    let payload = strip_data_uri_prefix(&request.base64_data);
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 data: {e}")))?;

    let path = state.storage.save_image(&request.filename, &bytes).await?;

    Ok(Json(SaveResponse::stored_at(path)))
}

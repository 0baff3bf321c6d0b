pub mod health;

use std::path::Path;

use axum::routing::post;
use axum::Router;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::state::AppState;
use crate::storage::{DATA_DIR, IMAGES_DIR};

/// Build the `/api` route tree.
///
/// ```text
/// POST /save-scenes    overwrite the saved document
/// POST /save-image     store an image, respond with its path
/// ```
///
/// Other methods on these paths get `405 Method Not Allowed`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/save-scenes", post(handlers::documents::save_document))
        .route("/save-image", post(handlers::images::save_image))
}

/// Static routes for the files the API writes: `/data/*` and `/images/*`.
pub fn public_files(public_dir: &Path) -> Router<AppState> {
    Router::new()
        .nest_service("/data", ServeDir::new(public_dir.join(DATA_DIR)))
        .nest_service("/images", ServeDir::new(public_dir.join(IMAGES_DIR)))
}

//! Wire contract between the store's remote client and the document service.

use serde::{Deserialize, Serialize};

/// Path the saved document is served from.
pub const DOCUMENT_PATH: &str = "/data/scenes.json";

/// Remote save endpoint for the whole document.
pub const SAVE_DOCUMENT_PATH: &str = "/api/save-scenes";

/// Blob save endpoint.
pub const SAVE_BLOB_PATH: &str = "/api/save-image";

/// Body of a blob save request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBlobRequest {
    pub filename: String,
    /// Base64 payload, optionally with a `data:<mime>;base64,` header.
    pub base64_data: String,
}

/// Response of both save endpoints.
///
/// `{"success": true}` for a saved document, `{"success": true, "path": ...}`
/// for a saved blob, `{"success": false, "error": ...}` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn saved() -> Self {
        Self {
            success: true,
            path: None,
            error: None,
        }
    }

    pub fn stored_at(path: String) -> Self {
        Self {
            success: true,
            path: Some(path),
            error: None,
        }
    }
}

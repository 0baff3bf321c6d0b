//! Import and export of whole documents as JSON text.

use crate::document::StoryDocument;
use crate::error::CoreError;
use crate::validation::document_from_value;

/// Suggested file name for an exported document.
pub const EXPORT_FILE_NAME: &str = "storybook-data.json";

/// Parse and validate an imported JSON string.
///
/// Malformed JSON yields [`CoreError::Parse`]; well-formed JSON of the wrong
/// shape yields [`CoreError::Validation`].
pub fn parse_document(json: &str) -> Result<StoryDocument, CoreError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    document_from_value(value)
}

/// Serialize a document as pretty-printed JSON (two-space indent).
pub fn export_document(document: &StoryDocument) -> Result<String, CoreError> {
    serde_json::to_string_pretty(document).map_err(|e| CoreError::Internal(e.to_string()))
}

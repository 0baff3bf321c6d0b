//! Schema validation for story documents arriving from outside the process.
//!
//! Imports, cache entries and save requests are checked field by field
//! before they are turned into a [`StoryDocument`], so a wrongly shaped value
//! is rejected with a precise message instead of being partially adopted.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::document::StoryDocument;
use crate::error::CoreError;

/// Scene fields that must be present as strings.
const SCENE_STRING_FIELDS: &[&str] = &["imageUrl", "text"];

/// Validate that `value` has the shape of a story document.
///
/// - the root is an object
/// - `scenes` is present and is an array of objects
/// - each scene has an integer `id` and string `imageUrl` and `text`
/// - scene ids are unique
/// - `audioUrl`, if present, is a string
pub fn validate_document(value: &Value) -> Result<(), CoreError> {
    let root = value.as_object().ok_or_else(|| {
        CoreError::Validation("document must be a JSON object".to_string())
    })?;

    if let Some(audio) = root.get("audioUrl") {
        if !audio.is_string() {
            return Err(CoreError::Validation(
                "audioUrl must be a string".to_string(),
            ));
        }
    }

    let scenes = root
        .get("scenes")
        .ok_or_else(|| CoreError::Validation("missing required field 'scenes'".to_string()))?
        .as_array()
        .ok_or_else(|| CoreError::Validation("scenes must be an array".to_string()))?;

    let mut seen = HashSet::with_capacity(scenes.len());
    for (index, scene) in scenes.iter().enumerate() {
        let scene = scene.as_object().ok_or_else(|| {
            CoreError::Validation(format!("scenes[{index}] must be an object"))
        })?;
        let id = validate_scene(index, scene)?;
        if !seen.insert(id) {
            return Err(CoreError::Validation(format!(
                "scenes[{index}] has duplicate id {id}"
            )));
        }
    }

    Ok(())
}

/// Validate one scene object, returning its id.
fn validate_scene(index: usize, scene: &Map<String, Value>) -> Result<i64, CoreError> {
    let id = scene
        .get("id")
        .ok_or_else(|| CoreError::Validation(format!("scenes[{index}] is missing 'id'")))?
        .as_i64()
        .ok_or_else(|| {
            CoreError::Validation(format!("scenes[{index}].id must be an integer"))
        })?;

    for field in SCENE_STRING_FIELDS {
        match scene.get(*field) {
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(CoreError::Validation(format!(
                    "scenes[{index}].{field} must be a string"
                )))
            }
            None => {
                return Err(CoreError::Validation(format!(
                    "scenes[{index}] is missing '{field}'"
                )))
            }
        }
    }

    Ok(id)
}

/// Validate `value` and convert it into a [`StoryDocument`].
pub fn document_from_value(value: Value) -> Result<StoryDocument, CoreError> {
    validate_document(&value)?;
    Ok(serde_json::from_value(value)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

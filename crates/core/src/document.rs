//! Scenes and the story document.
//!
//! The scene sequence order is the navigation order; there is no separate
//! rank field. Every operation here keeps scene ids unique.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{SceneId, FIRST_SCENE_ID};

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// One page of the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Unique within the document, stable across edits and reorders.
    pub id: SceneId,
    /// Inline data URI or a path to stored blob content.
    pub image_url: String,
    /// Display text. May be empty; embedded line breaks are preserved.
    pub text: String,
}

/// A scene that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScene {
    pub image_url: String,
    pub text: String,
}

impl NewScene {
    pub fn new(image_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            text: text.into(),
        }
    }

    fn with_id(self, id: SceneId) -> Scene {
        Scene {
            id,
            image_url: self.image_url,
            text: self.text,
        }
    }
}

/// Partial scene update. `None` fields are left untouched; the id can never
/// be changed through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ScenePatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn image_url(image_url: impl Into<String>) -> Self {
        Self {
            image_url: Some(image_url.into()),
            ..Self::default()
        }
    }

    /// True if applying this patch could not change anything.
    pub fn is_empty(&self) -> bool {
        self.image_url.is_none() && self.text.is_none()
    }

    fn apply(&self, scene: &mut Scene) {
        if let Some(image_url) = &self.image_url {
            scene.image_url.clone_from(image_url);
        }
        if let Some(text) = &self.text {
            scene.text.clone_from(text);
        }
    }
}

// ---------------------------------------------------------------------------
// StoryDocument
// ---------------------------------------------------------------------------

/// The full persisted unit: background audio plus the ordered scenes.
///
/// Serialized as `{"audioUrl": "...", "scenes": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDocument {
    /// Background audio reference; empty means no audio.
    #[serde(rename = "audioUrl", default)]
    pub audio_ref: String,
    pub scenes: Vec<Scene>,
}

impl StoryDocument {
    pub fn new(audio_ref: impl Into<String>, scenes: Vec<Scene>) -> Self {
        Self {
            audio_ref: audio_ref.into(),
            scenes,
        }
    }

    /// A document with zero scenes ("no content yet").
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// True if the document has at least one scene or an audio reference.
    /// Only such documents are mirrored to persistence.
    pub fn has_content(&self) -> bool {
        !self.scenes.is_empty() || !self.audio_ref.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == id)
    }

    /// Id the next appended scene receives: one more than the current
    /// maximum, or [`FIRST_SCENE_ID`] for an empty document.
    ///
    /// Derived fresh from the scenes on every call, so an id freed by a
    /// delete may be handed out again once it is above every remaining id.
    /// `None` once the maximum id is [`SceneId::MAX`].
    pub fn next_scene_id(&self) -> Option<SceneId> {
        match self.scenes.iter().map(|s| s.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(FIRST_SCENE_ID),
        }
    }

    /// Append a scene, assigning it the next id. Returns the assigned id,
    /// or [`CoreError::IdsExhausted`] without appending anything.
    pub fn push_scene(&mut self, scene: NewScene) -> Result<SceneId, CoreError> {
        let id = self.next_scene_id().ok_or(CoreError::IdsExhausted)?;
        self.scenes.push(scene.with_id(id));
        Ok(id)
    }

    /// Apply `patch` to the scene with `id`. Returns `false` if no scene
    /// has that id.
    pub fn update_scene(&mut self, id: SceneId, patch: &ScenePatch) -> bool {
        match self.scenes.iter_mut().find(|s| s.id == id) {
            Some(scene) => {
                patch.apply(scene);
                true
            }
            None => false,
        }
    }

    /// Remove the scene with `id`, returning it.
    pub fn remove_scene(&mut self, id: SceneId) -> Option<Scene> {
        let index = self.position(id)?;
        Some(self.scenes.remove(index))
    }

    /// Move the scene at `from` so that it ends up at `to`.
    ///
    /// The element is removed first, then inserted at `to` in the shortened
    /// sequence. Both indices must be within `[0, len - 1]`; otherwise the
    /// sequence is left unchanged and `false` is returned.
    pub fn move_scene(&mut self, from: usize, to: usize) -> bool {
        let len = self.scenes.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let scene = self.scenes.remove(from);
            self.scenes.insert(to, scene);
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

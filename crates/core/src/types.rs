/// Scene identifiers are plain integers, unique within one document.
pub type SceneId = i64;

/// First id handed out when a document has no scenes.
pub const FIRST_SCENE_ID: SceneId = 1;

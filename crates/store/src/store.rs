//! The story state store.
//!
//! [`StoryStore`] owns the current [`StoryDocument`] for one editing or
//! viewing session. Mutations are synchronous: each one produces a new
//! document snapshot and then mirrors it through the
//! [`PersistenceGateway`] in background tasks. Persistence is best effort;
//! a failed write is logged and never undoes or blocks a mutation.
//!
//! Background writes are not ordered relative to each other. Two quick
//! mutations start two independent remote writes and the one that finishes
//! last wins, even if it carries the older document. Each write is logged
//! with the store [`revision`](StoryStore::revision) it was started for.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use storybook_core::document::{NewScene, ScenePatch, StoryDocument};
use storybook_core::error::CoreError;
use storybook_core::media::{is_inline, media_file_name};
use storybook_core::transfer::{export_document, parse_document, EXPORT_FILE_NAME};
use storybook_core::types::SceneId;
use storybook_core::validation::document_from_value;
use tokio::runtime::Handle;
use tokio::task::JoinSet;

use crate::config::{Deployment, LoadStrategy, StoreConfig, StoreOptions};
use crate::error::StoreError;
use crate::gateway::PersistenceGateway;

// ---------------------------------------------------------------------------
// Phases and outcomes
// ---------------------------------------------------------------------------

/// Lifecycle of the store's initial load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// No load has settled yet; persistence is suppressed.
    Loading,
    /// The load settled; every mutation is persisted.
    Ready,
}

/// Where the document adopted by [`StoryStore::load`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Cache,
    Remote,
    /// Neither source had data; the store holds an empty document.
    Empty,
}

// ---------------------------------------------------------------------------
// StoryStore
// ---------------------------------------------------------------------------

pub struct StoryStore {
    document: Arc<StoryDocument>,
    phase: LoadPhase,
    options: StoreOptions,
    gateway: Arc<dyn PersistenceGateway>,
    pending: JoinSet<()>,
    revision: u64,
}

impl StoryStore {
    /// Create a store holding an empty document, in [`LoadPhase::Loading`].
    pub fn new(gateway: Arc<dyn PersistenceGateway>, options: StoreOptions) -> Self {
        Self {
            document: Arc::new(StoryDocument::default()),
            phase: LoadPhase::Loading,
            options,
            gateway,
            pending: JoinSet::new(),
            revision: 0,
        }
    }

    /// Create a store backed by the gateway described in `config`.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let gateway = config.build_gateway()?;
        Ok(Self::new(Arc::new(gateway), config.options))
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Number of document changes since the store was created.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn document(&self) -> &StoryDocument {
        &self.document
    }

    /// Cheap handle to the current document. Later mutations never change
    /// a snapshot that has already been handed out.
    pub fn snapshot(&self) -> Arc<StoryDocument> {
        Arc::clone(&self.document)
    }

    // -- loading ------------------------------------------------------------

    /// Load the initial document and enter [`LoadPhase::Ready`].
    ///
    /// Adopting the loaded document does not write it back anywhere. The
    /// phase changes only after every backend call has settled, whatever
    /// its result.
    pub async fn load(&mut self) -> LoadOutcome {
        self.phase = LoadPhase::Loading;

        let (document, outcome) = match self.options.load_strategy {
            LoadStrategy::CacheFirst => self.load_cache_first().await,
            LoadStrategy::RemoteFirst => self.load_remote_first().await,
        };

        self.document = Arc::new(document);
        self.revision += 1;
        self.phase = LoadPhase::Ready;

        tracing::info!(
            ?outcome,
            scenes = self.document.len(),
            has_audio = !self.document.audio_ref.is_empty(),
            "Story document loaded"
        );
        outcome
    }

    async fn load_cache_first(&self) -> (StoryDocument, LoadOutcome) {
        if let Some(cached) = self.cached_document().await {
            if !cached.is_empty() {
                return (cached, LoadOutcome::Cache);
            }
        }
        match self.remote_document().await {
            Some(remote) => (remote, LoadOutcome::Remote),
            None => (StoryDocument::default(), LoadOutcome::Empty),
        }
    }

    async fn load_remote_first(&self) -> (StoryDocument, LoadOutcome) {
        if let Some(remote) = self.remote_document().await {
            if !remote.is_empty() {
                return (remote, LoadOutcome::Remote);
            }
        }
        match self.cached_document().await {
            Some(cached) if cached.has_content() => (cached, LoadOutcome::Cache),
            _ => (StoryDocument::default(), LoadOutcome::Empty),
        }
    }

    async fn cached_document(&self) -> Option<StoryDocument> {
        match self.gateway.load_cache().await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cached story document");
                None
            }
        }
    }

    async fn remote_document(&self) -> Option<StoryDocument> {
        match self.gateway.load_remote().await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load remote story document");
                None
            }
        }
    }

    /// Re-adopt the cached document, if one exists. Returns whether the
    /// document was replaced. Nothing is written back.
    pub async fn reload_from_cache(&mut self) -> bool {
        match self.cached_document().await {
            Some(cached) => {
                self.document = Arc::new(cached);
                self.revision += 1;
                tracing::info!(scenes = self.document.len(), "Reloaded story document from cache");
                true
            }
            None => false,
        }
    }

    // -- mutations ----------------------------------------------------------

    /// Append a scene, assigning it one more than the current maximum id
    /// (or 1 for the first scene). Returns the assigned id.
    ///
    /// Fails with [`CoreError::IdsExhausted`] and leaves the document
    /// unchanged if the current maximum id is already [`SceneId::MAX`].
    pub fn add_scene(&mut self, scene: NewScene) -> Result<SceneId, StoreError> {
        if self.document.next_scene_id().is_none() {
            tracing::warn!("Scene not added, no scene id left to assign");
            return Err(CoreError::IdsExhausted.into());
        }
        let id = Arc::make_mut(&mut self.document).push_scene(scene)?;
        tracing::debug!(scene_id = id, "Scene added");
        self.commit();
        Ok(id)
    }

    /// Replace the given fields of the scene with `id`. Returns `false`
    /// (and changes nothing) if no scene has that id.
    pub fn update_scene(&mut self, id: SceneId, patch: ScenePatch) -> bool {
        if self.document.scene(id).is_none() {
            tracing::debug!(scene_id = id, "Update ignored, no such scene");
            return false;
        }
        if patch.is_empty() {
            return true;
        }
        Arc::make_mut(&mut self.document).update_scene(id, &patch);
        tracing::debug!(scene_id = id, "Scene updated");
        self.commit();
        true
    }

    /// Remove the scene with `id`. Returns `false` if there is none.
    pub fn delete_scene(&mut self, id: SceneId) -> bool {
        if self.document.position(id).is_none() {
            tracing::debug!(scene_id = id, "Delete ignored, no such scene");
            return false;
        }
        Arc::make_mut(&mut self.document).remove_scene(id);
        tracing::debug!(scene_id = id, "Scene deleted");
        self.commit();
        true
    }

    /// Move the scene at `from` to `to` (remove, then insert into the
    /// shortened sequence). Returns `false` and leaves the order unchanged
    /// if either index is outside `[0, len - 1]`.
    pub fn reorder_scenes(&mut self, from: usize, to: usize) -> bool {
        let len = self.document.len();
        if from >= len || to >= len {
            tracing::debug!(from, to, len, "Reorder ignored, index out of bounds");
            return false;
        }
        if from == to {
            return true;
        }
        Arc::make_mut(&mut self.document).move_scene(from, to);
        tracing::debug!(from, to, "Scenes reordered");
        self.commit();
        true
    }

    /// Swap the scene at `index` with the one before it.
    pub fn move_scene_up(&mut self, index: usize) -> bool {
        match index.checked_sub(1) {
            Some(target) if index < self.document.len() => self.reorder_scenes(index, target),
            _ => false,
        }
    }

    /// Swap the scene at `index` with the one after it.
    pub fn move_scene_down(&mut self, index: usize) -> bool {
        match index.checked_add(1) {
            Some(target) if target < self.document.len() => self.reorder_scenes(index, target),
            _ => false,
        }
    }

    /// Replace the background audio reference. An empty string removes it.
    pub fn set_audio_ref(&mut self, audio_ref: impl Into<String>) {
        Arc::make_mut(&mut self.document).audio_ref = audio_ref.into();
        tracing::debug!("Audio reference updated");
        self.commit();
    }

    /// Replace the whole document with `value` after validating its shape.
    ///
    /// On a validation error the current document is kept and the error is
    /// returned to the caller.
    pub fn replace_document(&mut self, value: serde_json::Value) -> Result<(), StoreError> {
        let document = document_from_value(value).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected replacement document");
        })?;
        self.adopt(document);
        Ok(())
    }

    /// Replace the whole document with one parsed from imported JSON text.
    pub fn import_json(&mut self, json: &str) -> Result<(), StoreError> {
        let document = parse_document(json).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected imported document");
        })?;
        self.adopt(document);
        Ok(())
    }

    fn adopt(&mut self, document: StoryDocument) {
        self.document = Arc::new(document);
        tracing::info!(scenes = self.document.len(), "Story document replaced");
        self.commit();
    }

    // -- export -------------------------------------------------------------

    /// Copy of the current document for serialization.
    pub fn export_document(&self) -> StoryDocument {
        StoryDocument::clone(&self.document)
    }

    /// Pretty-printed JSON of the current document.
    pub fn export_json(&self) -> Result<String, StoreError> {
        Ok(export_document(&self.document)?)
    }

    /// Write the exported document to `dir/storybook-data.json`, returning
    /// the written path.
    pub async fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, StoreError> {
        let json = self.export_json()?;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(EXPORT_FILE_NAME);
        tokio::fs::write(&path, json).await?;
        tracing::info!(path = %path.display(), "Story document exported");
        Ok(path)
    }

    /// Replace the whole document with the contents of an exported file.
    pub async fn import_file(&mut self, path: &Path) -> Result<(), StoreError> {
        let json = tokio::fs::read_to_string(path).await?;
        self.import_json(&json)
    }

    // -- persistence --------------------------------------------------------

    /// Store inline media out of line, returning the reference to keep in
    /// the document. References that are already paths are returned as is;
    /// if the blob save fails the inline content comes back unchanged.
    ///
    /// A `suggested_name` without an extension gets one from the media type
    /// of `content` (`scene-4` becomes `scene-4.png`).
    pub async fn upload_media(&self, content: &str, suggested_name: &str) -> String {
        if !is_inline(content) {
            return content.to_string();
        }
        let filename = if Path::new(suggested_name).extension().is_some() {
            suggested_name.to_string()
        } else {
            media_file_name(suggested_name, content)
        };
        self.gateway.save_blob(content, &filename).await
    }

    /// Save the current document now and wait for the result: the cache
    /// always, the remote store too in an authoring deployment.
    pub async fn save_now(&self) -> Result<(), StoreError> {
        if self.phase == LoadPhase::Loading {
            return Err(StoreError::NotReady);
        }

        let cache = self.gateway.save_cache(&self.document).await;
        let remote = match self.options.deployment {
            Deployment::Authoring => self.gateway.save_remote(&self.document).await,
            Deployment::Viewer => Ok(()),
        };

        cache?;
        remote?;
        tracing::info!(revision = self.revision, "Story document saved");
        Ok(())
    }

    /// Wait for every background write started so far.
    pub async fn flush(&mut self) {
        while let Some(result) = self.pending.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Persistence task failed");
            }
        }
    }

    /// Number of background writes not yet collected.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    fn commit(&mut self) {
        self.revision += 1;
        self.persist();
    }

    /// Mirror the current document in background tasks.
    fn persist(&mut self) {
        if self.phase == LoadPhase::Loading {
            tracing::debug!(revision = self.revision, "Persistence suppressed while loading");
            return;
        }
        if !self.document.has_content() {
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!(
                revision = self.revision,
                "No async runtime available, story document not persisted"
            );
            return;
        };

        while let Some(result) = self.pending.try_join_next() {
            if let Err(e) = result {
                tracing::error!(error = %e, "Persistence task failed");
            }
        }

        let revision = self.revision;

        let gateway = Arc::clone(&self.gateway);
        let document = self.snapshot();
        self.pending.spawn_on(
            async move {
                match gateway.save_cache(&document).await {
                    Ok(()) => tracing::debug!(revision, "Story document cached"),
                    Err(e) => {
                        tracing::warn!(revision, error = %e, "Failed to cache story document")
                    }
                }
            },
            &handle,
        );

        if self.options.deployment == Deployment::Authoring {
            let gateway = Arc::clone(&self.gateway);
            let document = self.snapshot();
            self.pending.spawn_on(
                async move {
                    match gateway.save_remote(&document).await {
                        Ok(()) => tracing::debug!(revision, "Story document saved remotely"),
                        Err(e) => tracing::error!(
                            revision,
                            error = %e,
                            "Failed to save story document remotely"
                        ),
                    }
                },
                &handle,
            );
        }
    }
}

impl Drop for StoryStore {
    /// In-flight writes keep running after the store is gone.
    fn drop(&mut self) {
        self.pending.detach_all();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;
    use storybook_core::document::Scene;

    use super::*;
    use crate::memory::MemoryGateway;

    const AUTHORING: StoreOptions = StoreOptions {
        deployment: Deployment::Authoring,
        load_strategy: LoadStrategy::CacheFirst,
    };

    fn scene(id: SceneId, text: &str) -> Scene {
        Scene {
            id,
            image_url: format!("/images/{id}.png"),
            text: text.to_string(),
        }
    }

    fn abc() -> StoryDocument {
        StoryDocument::new("", vec![scene(1, "A"), scene(2, "B"), scene(3, "C")])
    }

    fn ids(store: &StoryStore) -> Vec<SceneId> {
        store.document().scenes.iter().map(|s| s.id).collect()
    }

    async fn ready_store(gateway: Arc<MemoryGateway>, options: StoreOptions) -> StoryStore {
        let mut store = StoryStore::new(gateway, options);
        store.load().await;
        store
    }

    async fn store_with(document: StoryDocument) -> (StoryStore, Arc<MemoryGateway>) {
        let gateway = Arc::new(MemoryGateway::new().with_cache(document));
        let store = ready_store(Arc::clone(&gateway), AUTHORING).await;
        (store, gateway)
    }

    // -- loading ------------------------------------------------------------

    #[tokio::test]
    async fn starts_empty_and_loading() {
        let store = StoryStore::new(Arc::new(MemoryGateway::new()), StoreOptions::default());
        assert_eq!(store.phase(), LoadPhase::Loading);
        assert!(store.document().is_empty());
    }

    #[tokio::test]
    async fn cache_first_prefers_cache_with_scenes() {
        let gateway = Arc::new(
            MemoryGateway::new()
                .with_cache(abc())
                .with_remote(StoryDocument::new("", vec![scene(9, "remote")])),
        );
        let mut store = StoryStore::new(gateway, StoreOptions::default());
        assert_eq!(store.load().await, LoadOutcome::Cache);
        assert_eq!(store.document(), &abc());
        assert_eq!(store.phase(), LoadPhase::Ready);
    }

    #[tokio::test]
    async fn cache_first_skips_cache_without_scenes() {
        let remote = StoryDocument::new("", vec![scene(9, "remote")]);
        let gateway = Arc::new(
            MemoryGateway::new()
                .with_cache(StoryDocument::new("/audio/a.mp3", vec![]))
                .with_remote(remote.clone()),
        );
        let mut store = StoryStore::new(gateway, StoreOptions::default());
        assert_eq!(store.load().await, LoadOutcome::Remote);
        assert_eq!(store.document(), &remote);
    }

    #[tokio::test]
    async fn remote_first_prefers_remote() {
        let remote = StoryDocument::new("", vec![scene(9, "remote")]);
        let gateway = Arc::new(
            MemoryGateway::new()
                .with_cache(abc())
                .with_remote(remote.clone()),
        );
        let options = StoreOptions {
            load_strategy: LoadStrategy::RemoteFirst,
            ..StoreOptions::default()
        };
        let mut store = StoryStore::new(gateway, options);
        assert_eq!(store.load().await, LoadOutcome::Remote);
        assert_eq!(store.document(), &remote);
    }

    #[tokio::test]
    async fn remote_first_falls_back_to_cache_when_remote_fails() {
        let gateway = Arc::new(MemoryGateway::new().with_cache(abc()));
        gateway.set_fail_remote(true);
        let options = StoreOptions {
            load_strategy: LoadStrategy::RemoteFirst,
            ..StoreOptions::default()
        };
        let mut store = StoryStore::new(gateway, options);
        assert_eq!(store.load().await, LoadOutcome::Cache);
        assert_eq!(store.document(), &abc());
    }

    #[tokio::test]
    async fn nothing_anywhere_loads_empty_and_ready() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.set_fail_cache(true);
        gateway.set_fail_remote(true);
        let mut store = StoryStore::new(gateway, AUTHORING);
        assert_eq!(store.load().await, LoadOutcome::Empty);
        assert!(store.document().is_empty());
        assert_eq!(store.phase(), LoadPhase::Ready);
    }

    #[tokio::test]
    async fn loading_does_not_write_back() {
        let (mut store, gateway) = store_with(abc()).await;
        store.flush().await;
        assert_eq!(gateway.cache_writes(), 0);
        assert_eq!(gateway.remote_writes(), 0);
    }

    #[tokio::test]
    async fn mutations_before_load_are_not_persisted() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut store = StoryStore::new(gateway.clone(), AUTHORING);
        store.add_scene(NewScene::new("a", "a")).unwrap();
        store.flush().await;
        assert_eq!(gateway.cache_writes(), 0);
        assert_eq!(store.document().len(), 1);
    }

    // -- add / update / delete ----------------------------------------------

    #[tokio::test]
    async fn add_assigns_max_plus_one() {
        let (mut store, _) = store_with(StoryDocument::default()).await;
        assert_eq!(store.add_scene(NewScene::new("1", "s1")).unwrap(), 1);
        assert_eq!(store.add_scene(NewScene::new("2", "s2")).unwrap(), 2);
        assert!(store.delete_scene(1));
        assert_eq!(store.add_scene(NewScene::new("3", "s3")).unwrap(), 3);
        assert_eq!(ids(&store), vec![2, 3]);
    }

    #[tokio::test]
    async fn add_after_max_id_fails_without_change() {
        let (mut store, _) = store_with(StoryDocument::default()).await;
        let json = r#"{"audioUrl":"","scenes":[{"id":9223372036854775807,"imageUrl":"/images/z.png","text":"z"}]}"#;
        store.import_json(json).unwrap();
        let before = store.snapshot();
        let revision = store.revision();

        let result = store.add_scene(NewScene::new("/images/a.png", "a"));
        assert_matches!(result, Err(StoreError::Core(CoreError::IdsExhausted)));
        assert_eq!(store.document(), &*before);
        assert_eq!(store.revision(), revision);
    }

    #[tokio::test]
    async fn update_text_only() {
        let (mut store, _) = store_with(abc()).await;
        assert!(store.update_scene(2, ScenePatch::text("X")));
        let updated = store.document().scene(2).unwrap();
        assert_eq!(updated.text, "X");
        assert_eq!(updated.image_url, "/images/2.png");
    }

    #[tokio::test]
    async fn update_missing_id_changes_nothing() {
        let (mut store, _) = store_with(abc()).await;
        let revision = store.revision();
        assert!(!store.update_scene(42, ScenePatch::text("X")));
        assert_eq!(store.document(), &abc());
        assert_eq!(store.revision(), revision);
    }

    #[tokio::test]
    async fn delete_missing_id_changes_nothing() {
        let (mut store, _) = store_with(abc()).await;
        assert!(!store.delete_scene(42));
        assert_eq!(store.document(), &abc());
    }

    // -- reorder ------------------------------------------------------------

    #[tokio::test]
    async fn reorder_last_to_first() {
        let (mut store, _) = store_with(abc()).await;
        assert!(store.reorder_scenes(2, 0));
        assert_eq!(ids(&store), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn reorder_out_of_bounds_is_noop() {
        let (mut store, _) = store_with(abc()).await;
        assert!(!store.reorder_scenes(0, 3));
        assert!(!store.reorder_scenes(5, 1));
        assert_eq!(ids(&store), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn move_helpers_respect_bounds() {
        let (mut store, _) = store_with(abc()).await;
        assert!(!store.move_scene_up(0));
        assert!(!store.move_scene_down(2));
        assert!(!store.move_scene_up(7));
        assert!(store.move_scene_up(2));
        assert_eq!(ids(&store), vec![1, 3, 2]);
        assert!(store.move_scene_down(0));
        assert_eq!(ids(&store), vec![3, 1, 2]);
        assert!(!store.move_scene_down(usize::MAX));
        assert_eq!(ids(&store), vec![3, 1, 2]);
    }

    // -- audio / replace / import -------------------------------------------

    #[tokio::test]
    async fn set_audio_ref_replaces_unconditionally() {
        let (mut store, _) = store_with(abc()).await;
        store.set_audio_ref("/audio/theme.mp3");
        assert_eq!(store.document().audio_ref, "/audio/theme.mp3");
        store.set_audio_ref("");
        assert_eq!(store.document().audio_ref, "");
    }

    #[tokio::test]
    async fn replace_rejects_missing_scenes_and_keeps_document() {
        let (mut store, _) = store_with(abc()).await;
        let result = store.replace_document(json!({ "audioUrl": "x" }));
        assert_matches!(result, Err(StoreError::Core(CoreError::Validation(_))));
        assert_eq!(store.document(), &abc());
    }

    #[tokio::test]
    async fn replace_with_export_is_identity() {
        let (mut store, _) = store_with(abc()).await;
        store.set_audio_ref("/audio/theme.mp3");
        let before = store.export_document();
        let exported = serde_json::to_value(store.export_document()).unwrap();
        store.replace_document(exported).unwrap();
        assert_eq!(store.document(), &before);
    }

    #[tokio::test]
    async fn import_rejects_malformed_json() {
        let (mut store, _) = store_with(abc()).await;
        let result = store.import_json("{ \"scenes\": [");
        assert_matches!(result, Err(StoreError::Core(CoreError::Parse(_))));
        assert_eq!(store.document(), &abc());
    }

    #[tokio::test]
    async fn import_then_export_round_trips() {
        let (mut store, _) = store_with(StoryDocument::default()).await;
        let json = export_document(&abc()).unwrap();
        store.import_json(&json).unwrap();
        assert_eq!(store.export_json().unwrap(), json);
    }

    #[tokio::test]
    async fn export_file_reimports_into_another_store() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let (store, _) = store_with(abc()).await;
        let path = store.export_to_dir(dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("storybook-data.json"));

        let (mut other, _) = store_with(StoryDocument::default()).await;
        other.import_file(&path).await.unwrap();
        assert_eq!(other.document(), &abc());
    }

    #[tokio::test]
    async fn import_of_missing_file_keeps_document() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let (mut store, _) = store_with(abc()).await;
        let result = store.import_file(&dir.path().join("absent.json")).await;
        assert_matches!(result, Err(StoreError::Io(_)));
        assert_eq!(store.document(), &abc());
    }

    // -- snapshots ----------------------------------------------------------

    #[tokio::test]
    async fn snapshots_are_not_affected_by_later_mutations() {
        let (mut store, _) = store_with(abc()).await;
        let before = store.snapshot();
        store.delete_scene(1);
        assert_eq!(before.len(), 3);
        assert_eq!(store.document().len(), 2);
    }

    // -- persistence fan-out ------------------------------------------------

    #[tokio::test]
    async fn authoring_mutation_writes_cache_and_remote() {
        let (mut store, gateway) = store_with(StoryDocument::default()).await;
        store.add_scene(NewScene::new("/images/a.png", "a")).unwrap();
        store.flush().await;
        assert_eq!(gateway.cache_writes(), 1);
        assert_eq!(gateway.remote_writes(), 1);
        assert_eq!(gateway.remote().unwrap(), store.export_document());
    }

    #[tokio::test]
    async fn viewer_mutation_writes_cache_only() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut store = ready_store(Arc::clone(&gateway), StoreOptions::default()).await;
        store.set_audio_ref("/audio/a.mp3");
        store.flush().await;
        assert_eq!(gateway.cache_writes(), 1);
        assert_eq!(gateway.remote_writes(), 0);
    }

    #[tokio::test]
    async fn empty_document_is_not_persisted() {
        let (mut store, gateway) = store_with(StoryDocument::new("", vec![scene(1, "A")])).await;
        store.delete_scene(1);
        store.flush().await;
        assert_eq!(gateway.cache_writes(), 0);
        assert_eq!(gateway.remote_writes(), 0);
    }

    #[tokio::test]
    async fn failed_writes_do_not_affect_document() {
        let (mut store, gateway) = store_with(abc()).await;
        gateway.set_fail_cache(true);
        gateway.set_fail_remote(true);
        store.update_scene(1, ScenePatch::text("still editing"));
        store.flush().await;
        assert_eq!(store.document().scene(1).unwrap().text, "still editing");
        assert_eq!(gateway.cache(), Some(abc()));
        assert_eq!(store.pending_writes(), 0);
    }

    #[tokio::test]
    async fn save_now_reports_remote_failure() {
        let (store, gateway) = store_with(abc()).await;
        gateway.set_fail_remote(true);
        assert_matches!(store.save_now().await, Err(StoreError::Gateway(_)));
        assert_eq!(gateway.cache_writes(), 1);
    }

    #[tokio::test]
    async fn save_now_refuses_before_load() {
        let store = StoryStore::new(Arc::new(MemoryGateway::new()), AUTHORING);
        assert_matches!(store.save_now().await, Err(StoreError::NotReady));
    }

    #[tokio::test]
    async fn reload_from_cache_adopts_cached_document() {
        let (mut store, gateway) = store_with(StoryDocument::default()).await;
        gateway.save_cache(&abc()).await.unwrap();
        assert!(store.reload_from_cache().await);
        assert_eq!(store.document(), &abc());
    }

    // -- media --------------------------------------------------------------

    #[tokio::test]
    async fn upload_media_stores_inline_content() {
        let (store, gateway) = store_with(abc()).await;
        let reference = store
            .upload_media("data:image/png;base64,AAAA", "scene-4.png")
            .await;
        assert_eq!(reference, "/images/scene-4.png");
        assert!(gateway.blob("scene-4.png").is_some());
    }

    #[tokio::test]
    async fn upload_media_adds_extension_from_media_type() {
        let (store, gateway) = store_with(abc()).await;
        let reference = store
            .upload_media("data:image/jpeg;base64,AAAA", "scene-5")
            .await;
        assert_eq!(reference, "/images/scene-5.jpg");
        assert!(gateway.blob("scene-5.jpg").is_some());
    }

    #[tokio::test]
    async fn upload_media_passes_paths_through() {
        let (store, gateway) = store_with(abc()).await;
        assert_eq!(store.upload_media("/images/1.png", "x.png").await, "/images/1.png");
        assert!(gateway.blob("x.png").is_none());
    }

    #[tokio::test]
    async fn upload_media_falls_back_to_inline_on_failure() {
        let (store, gateway) = store_with(abc()).await;
        gateway.set_fail_blobs(true);
        let inline = "data:image/png;base64,AAAA";
        assert_eq!(store.upload_media(inline, "scene-4.png").await, inline);
    }

    #[tokio::test]
    async fn finished_writes_are_reaped_on_later_mutations() {
        let (mut store, gateway) = store_with(abc()).await;
        gateway.set_fail_remote(true);
        store.set_audio_ref("/audio/theme.mp3");
        assert_eq!(store.pending_writes(), 2);
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        // The two finished writes are collected before two new ones start.
        store.set_audio_ref("/audio/other.mp3");
        assert_eq!(store.pending_writes(), 2);
        store.flush().await;
        assert_eq!(store.pending_writes(), 0);
    }
}

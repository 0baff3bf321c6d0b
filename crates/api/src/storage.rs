//! Files served from the public tree.
//!
//! The saved document lives at `data/scenes.json` and blobs under `images/`,
//! both relative to the configured public directory. Every write goes to a
//! uniquely named temporary file first and is renamed into place.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use storybook_core::document::StoryDocument;
use storybook_core::media::{blob_path, validate_blob_filename};
use storybook_core::transfer::export_document;

use crate::error::AppResult;

/// Directory (under the public root) holding the saved document.
pub const DATA_DIR: &str = "data";

/// File name of the saved document.
pub const DOCUMENT_FILE: &str = "scenes.json";

/// Directory (under the public root) holding saved blobs.
pub const IMAGES_DIR: &str = "images";

#[derive(Debug)]
pub struct PublicStorage {
    root: PathBuf,
    write_seq: AtomicU64,
}

impl PublicStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_seq: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    pub fn document_path(&self) -> PathBuf {
        self.data_dir().join(DOCUMENT_FILE)
    }

    /// Overwrite the saved document with its pretty-printed JSON.
    pub async fn save_document(&self, document: &StoryDocument) -> AppResult<()> {
        let json = export_document(document)?;
        self.write_atomic(&self.data_dir(), DOCUMENT_FILE, json.as_bytes())
            .await?;
        tracing::info!(
            scenes = document.len(),
            path = %self.document_path().display(),
            "Story document saved"
        );
        Ok(())
    }

    /// Write `bytes` as `images/{filename}`, returning the served path.
    pub async fn save_image(&self, filename: &str, bytes: &[u8]) -> AppResult<String> {
        validate_blob_filename(filename)?;
        self.write_atomic(&self.images_dir(), filename, bytes).await?;
        tracing::info!(filename, size = bytes.len(), "Image saved");
        Ok(blob_path(filename))
    }

    async fn write_atomic(&self, dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(dir).await?;

        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = dir.join(format!(".{name}.{seq}.tmp"));

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, dir.join(name)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }
}

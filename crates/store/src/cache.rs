//! Durable local cache: a single JSON file under a fixed key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use storybook_core::document::StoryDocument;
use storybook_core::transfer::parse_document;

use crate::error::GatewayError;

/// Key the cached document is stored under.
pub const CACHE_KEY: &str = "rtms-storybook-data";

/// File-backed cache holding one serialized document.
///
/// Writes land in a uniquely named temporary file that is then renamed over
/// the entry, so a reader never sees a half-written document even when two
/// saves overlap.
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
    write_seq: AtomicU64,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_seq: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cache entry.
    pub fn entry_path(&self) -> PathBuf {
        self.dir.join(format!("{CACHE_KEY}.json"))
    }

    /// Read the cached document.
    ///
    /// A missing entry is `Ok(None)`. A malformed entry is logged and also
    /// treated as absent.
    pub async fn load(&self) -> Result<Option<StoryDocument>, GatewayError> {
        let path = self.entry_path();
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match parse_document(&text) {
            Ok(document) => Ok(Some(document)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring malformed cache entry"
                );
                Ok(None)
            }
        }
    }

    /// Replace the cached document.
    pub async fn save(&self, document: &StoryDocument) -> Result<(), GatewayError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_vec(document)?;
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = self.dir.join(format!("{CACHE_KEY}.{seq}.tmp"));

        tokio::fs::write(&tmp, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.entry_path()).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

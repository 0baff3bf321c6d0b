//! The persistence gateway: one seam over the local cache, the remote
//! document store and blob storage.
//!
//! Every call is independent and safe to repeat; saving the same document
//! twice leaves the backend in the same state as saving it once.

use async_trait::async_trait;
use storybook_core::document::StoryDocument;

use crate::cache::FileCache;
use crate::error::GatewayError;
use crate::remote::HttpRemote;

/// Storage backends the story store mirrors its document to.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Read the cached document, `None` if nothing usable is cached.
    async fn load_cache(&self) -> Result<Option<StoryDocument>, GatewayError>;

    async fn save_cache(&self, document: &StoryDocument) -> Result<(), GatewayError>;

    /// Fetch the remote document, `None` if the remote has none.
    async fn load_remote(&self) -> Result<Option<StoryDocument>, GatewayError>;

    async fn save_remote(&self, document: &StoryDocument) -> Result<(), GatewayError>;

    /// Store `content` out of line, returning the reference to it.
    async fn store_blob(&self, content: &str, suggested_name: &str)
        -> Result<String, GatewayError>;

    /// Store `content` out of line. On failure the original content is
    /// returned unchanged so the caller always has something renderable.
    async fn save_blob(&self, content: &str, suggested_name: &str) -> String {
        match self.store_blob(content, suggested_name).await {
            Ok(reference) => reference,
            Err(e) => {
                tracing::warn!(
                    filename = suggested_name,
                    error = %e,
                    "Blob save failed, keeping inline content"
                );
                content.to_string()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// StorybookGateway
// ---------------------------------------------------------------------------

/// Production gateway: a file cache plus an optional remote document store.
///
/// Without a remote, remote loads find nothing and remote or blob saves
/// fail with [`GatewayError::NotConfigured`].
pub struct StorybookGateway {
    cache: FileCache,
    remote: Option<HttpRemote>,
}

impl StorybookGateway {
    pub fn new(cache: FileCache, remote: Option<HttpRemote>) -> Self {
        Self { cache, remote }
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    fn remote(&self) -> Result<&HttpRemote, GatewayError> {
        self.remote
            .as_ref()
            .ok_or(GatewayError::NotConfigured("remote store"))
    }
}

#[async_trait]
impl PersistenceGateway for StorybookGateway {
    async fn load_cache(&self) -> Result<Option<StoryDocument>, GatewayError> {
        self.cache.load().await
    }

    async fn save_cache(&self, document: &StoryDocument) -> Result<(), GatewayError> {
        self.cache.save(document).await
    }

    async fn load_remote(&self) -> Result<Option<StoryDocument>, GatewayError> {
        match &self.remote {
            Some(remote) => remote.load().await,
            None => Ok(None),
        }
    }

    async fn save_remote(&self, document: &StoryDocument) -> Result<(), GatewayError> {
        self.remote()?.save(document).await
    }

    async fn store_blob(
        &self,
        content: &str,
        suggested_name: &str,
    ) -> Result<String, GatewayError> {
        self.remote()?.save_blob(content, suggested_name).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! In-memory persistence gateway.
//!
//! Holds the cache, the remote document and blobs in process. Each backend
//! can be switched into a failing mode, and writes are counted, which makes
//! it the gateway of choice for viewer-only sessions and for tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use storybook_core::document::StoryDocument;
use storybook_core::media::{blob_path, validate_blob_filename};

use crate::error::GatewayError;
use crate::gateway::PersistenceGateway;

#[derive(Debug, Default)]
struct MemoryState {
    cache: Option<StoryDocument>,
    remote: Option<StoryDocument>,
    blobs: HashMap<String, String>,
    fail_cache: bool,
    fail_remote: bool,
    fail_blobs: bool,
    cache_writes: usize,
    remote_writes: usize,
}

#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(self, document: StoryDocument) -> Self {
        self.lock().cache = Some(document);
        self
    }

    pub fn with_remote(self, document: StoryDocument) -> Self {
        self.lock().remote = Some(document);
        self
    }

    pub fn set_fail_cache(&self, fail: bool) {
        self.lock().fail_cache = fail;
    }

    pub fn set_fail_remote(&self, fail: bool) {
        self.lock().fail_remote = fail;
    }

    pub fn set_fail_blobs(&self, fail: bool) {
        self.lock().fail_blobs = fail;
    }

    pub fn cache(&self) -> Option<StoryDocument> {
        self.lock().cache.clone()
    }

    pub fn remote(&self) -> Option<StoryDocument> {
        self.lock().remote.clone()
    }

    pub fn blob(&self, filename: &str) -> Option<String> {
        self.lock().blobs.get(filename).cloned()
    }

    /// Number of successful cache writes.
    pub fn cache_writes(&self) -> usize {
        self.lock().cache_writes
    }

    /// Number of successful remote writes.
    pub fn remote_writes(&self) -> usize {
        self.lock().remote_writes
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unavailable(backend: &str) -> GatewayError {
    GatewayError::Io(std::io::Error::other(format!("{backend} unavailable")))
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn load_cache(&self) -> Result<Option<StoryDocument>, GatewayError> {
        let state = self.lock();
        if state.fail_cache {
            return Err(unavailable("cache"));
        }
        Ok(state.cache.clone())
    }

    async fn save_cache(&self, document: &StoryDocument) -> Result<(), GatewayError> {
        let mut state = self.lock();
        if state.fail_cache {
            return Err(unavailable("cache"));
        }
        state.cache = Some(document.clone());
        state.cache_writes += 1;
        Ok(())
    }

    async fn load_remote(&self) -> Result<Option<StoryDocument>, GatewayError> {
        let state = self.lock();
        if state.fail_remote {
            return Err(unavailable("remote store"));
        }
        Ok(state.remote.clone())
    }

    async fn save_remote(&self, document: &StoryDocument) -> Result<(), GatewayError> {
        let mut state = self.lock();
        if state.fail_remote {
            return Err(unavailable("remote store"));
        }
        state.remote = Some(document.clone());
        state.remote_writes += 1;
        Ok(())
    }

    async fn store_blob(
        &self,
        content: &str,
        suggested_name: &str,
    ) -> Result<String, GatewayError> {
        validate_blob_filename(suggested_name)?;
        let mut state = self.lock();
        if state.fail_blobs {
            return Err(unavailable("blob storage"));
        }
        state
            .blobs
            .insert(suggested_name.to_string(), content.to_string());
        Ok(blob_path(suggested_name))
    }
}

//! Store configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::FileCache;
use crate::error::StoreError;
use crate::gateway::StorybookGateway;
use crate::remote::HttpRemote;

/// Default cache directory when `STORYBOOK_CACHE_DIR` is not set.
const DEFAULT_CACHE_DIR: &str = ".storybook-cache";

/// Which copies a session mirrors its document to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Deployment {
    /// Read-only viewer: local cache writes only.
    #[default]
    Viewer,
    /// Authoring session: local cache and remote store writes.
    Authoring,
}

impl FromStr for Deployment {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Self::Viewer),
            "authoring" => Ok(Self::Authoring),
            other => Err(StoreError::Config(format!(
                "unknown deployment '{other}', expected 'viewer' or 'authoring'"
            ))),
        }
    }
}

/// Order in which the initial load consults the backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Prefer a cached document with scenes, fall back to the remote.
    #[default]
    CacheFirst,
    /// Prefer a non-empty remote document, fall back to the cache.
    RemoteFirst,
}

impl FromStr for LoadStrategy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cache-first" => Ok(Self::CacheFirst),
            "remote-first" => Ok(Self::RemoteFirst),
            other => Err(StoreError::Config(format!(
                "unknown load strategy '{other}', expected 'cache-first' or 'remote-first'"
            ))),
        }
    }
}

/// Behavioural options of a story store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub deployment: Deployment,
    pub load_strategy: LoadStrategy,
}

/// Story store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the local cache entry.
    pub cache_dir: PathBuf,
    /// Base URL of the document service; `None` disables the remote store.
    pub remote_url: Option<String>,
    /// Per-request timeout for the remote store; `None` means no timeout.
    pub remote_timeout: Option<Duration>,
    pub options: StoreOptions,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                        | Default             |
    /// |---------------------------------|---------------------|
    /// | `STORYBOOK_CACHE_DIR`           | `.storybook-cache`  |
    /// | `STORYBOOK_REMOTE_URL`          | unset (no remote)   |
    /// | `STORYBOOK_REMOTE_TIMEOUT_SECS` | unset (no timeout)  |
    /// | `STORYBOOK_DEPLOYMENT`          | `viewer`            |
    /// | `STORYBOOK_LOAD_STRATEGY`       | `cache-first`       |
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let cache_dir: PathBuf = lookup("STORYBOOK_CACHE_DIR")
            .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string())
            .into();

        let remote_url = lookup("STORYBOOK_REMOTE_URL").filter(|url| !url.trim().is_empty());

        let remote_timeout = lookup("STORYBOOK_REMOTE_TIMEOUT_SECS")
            .map(|secs| {
                secs.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                    StoreError::Config(format!(
                        "STORYBOOK_REMOTE_TIMEOUT_SECS must be a valid u64, got '{secs}'"
                    ))
                })
            })
            .transpose()?;

        let deployment = lookup("STORYBOOK_DEPLOYMENT")
            .map(|v| v.parse::<Deployment>())
            .transpose()?
            .unwrap_or_default();

        let load_strategy = lookup("STORYBOOK_LOAD_STRATEGY")
            .map(|v| v.parse::<LoadStrategy>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            cache_dir,
            remote_url,
            remote_timeout,
            options: StoreOptions {
                deployment,
                load_strategy,
            },
        })
    }

    /// Build the production gateway described by this configuration.
    pub fn build_gateway(&self) -> Result<StorybookGateway, StoreError> {
        let remote = match (&self.remote_url, self.remote_timeout) {
            (Some(url), Some(timeout)) => Some(HttpRemote::with_timeout(url.clone(), timeout)?),
            (Some(url), None) => Some(HttpRemote::new(url.clone())),
            (None, _) => None,
        };
        Ok(StorybookGateway::new(FileCache::new(&self.cache_dir), remote))
    }
}

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::storage::PublicStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Writer for the served document and blob files.
    pub storage: Arc<PublicStorage>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let storage = Arc::new(PublicStorage::new(&config.public_dir));
        Self {
            config: Arc::new(config),
            storage,
        }
    }
}

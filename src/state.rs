//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::highlights::{
    create_pool, HighlightService, HighlightStore, MemoryPageStore, PageStore, SqlitePageStore,
    StoreError,
};
use crate::overlay::OverlayEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    service: HighlightService,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config, service: HighlightService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, service }),
        }
    }

    /// Build the store backend and engine described by `config`
    pub async fn from_config(config: Config) -> Result<Self, StoreError> {
        let backend: Arc<dyn PageStore> = if config.database.is_memory() {
            tracing::info!("Using in-memory highlight store");
            Arc::new(MemoryPageStore::new())
        } else {
            let pool = create_pool(&config.database.url).await?;
            let store = SqlitePageStore::new(pool);
            store.init().await?;
            tracing::info!("Database initialized at {}", config.database.url);
            Arc::new(store)
        };

        let engine = OverlayEngine::new(config.overlay.engine_config());
        let service = HighlightService::new(HighlightStore::new(backend), engine);
        Ok(Self::new(config, service))
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the highlight service
    pub fn service(&self) -> &HighlightService {
        &self.inner.service
    }
}

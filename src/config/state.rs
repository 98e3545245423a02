// Application state module
// Shared collaborators handed to every request

use std::path::PathBuf;
use std::sync::Arc;

use super::types::Config;
use crate::media::{DiskStorage, MetadataCache, Storage};
use crate::stats::TransferStats;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Root directory of tracks and static assets
    pub media_root: PathBuf,
    pub storage: Arc<dyn Storage>,
    pub metadata_cache: MetadataCache,
    pub stats: Arc<TransferStats>,
}

impl AppState {
    /// Create `AppState` backed by the local filesystem
    pub fn new(config: &Config) -> Self {
        Self::with_storage(config, Arc::new(DiskStorage))
    }

    /// Create `AppState` with a custom storage backend
    pub fn with_storage(config: &Config, storage: Arc<dyn Storage>) -> Self {
        Self {
            config: config.clone(),
            media_root: config.media_root(),
            storage,
            metadata_cache: MetadataCache::new(config.cache_ttl(), config.cache.max_entries),
            stats: Arc::new(TransferStats::new()),
        }
    }
}

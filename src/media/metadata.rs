//! File metadata lookup and caching
//!
//! [`Storage`] is the only path to the filesystem; [`MetadataCache`] sits in front of it
//! so that repeated requests for a track within the TTL skip the `stat` call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;

/// Metadata of a servable file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub exists: bool,
}

/// Backing store for media files
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stat a regular file; directories and missing paths are `NotFound`
    async fn stat(&self, path: &Path) -> io::Result<FileMetadata>;

    /// Open a file for reading
    async fn open(&self, path: &Path) -> io::Result<File>;
}

/// Local filesystem storage
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskStorage;

#[async_trait]
impl Storage for DiskStorage {
    async fn stat(&self, path: &Path) -> io::Result<FileMetadata> {
        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
        }
        let last_modified = meta
            .modified()
            .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);

        Ok(FileMetadata {
            size: meta.len(),
            last_modified,
            exists: true,
        })
    }

    async fn open(&self, path: &Path) -> io::Result<File> {
        File::open(path).await
    }
}

/// Expiring metadata cache keyed by file path
///
/// Backed by moka: entries expire `ttl` after insertion and the entry count is
/// capped at `max_entries` (the eviction victim is unspecified).
pub struct MetadataCache {
    cache: moka::future::Cache<PathBuf, FileMetadata>,
}

impl MetadataCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let cache = moka::future::Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_entries)
            .build();

        Self { cache }
    }

    /// Returns None if not cached or expired
    pub async fn get(&self, path: &Path) -> Option<FileMetadata> {
        self.cache.get(path).await
    }

    pub async fn set(&self, path: PathBuf, metadata: FileMetadata) {
        self.cache.insert(path, metadata).await;
    }

    /// Forces moka to process pending evictions and expirations
    #[cfg(test)]
    pub async fn run_pending(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Approximate entry count
    #[cfg(test)]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

/// Cached metadata lookup, falling back to `storage` on a miss
pub async fn lookup(
    cache: &MetadataCache,
    storage: &dyn Storage,
    path: &Path,
) -> io::Result<FileMetadata> {
    if let Some(meta) = cache.get(path).await {
        return Ok(meta);
    }

    let meta = storage.stat(path).await?;
    if !meta.exists {
        return Err(io::Error::new(io::ErrorKind::NotFound, "file does not exist"));
    }
    cache.set(path.to_path_buf(), meta.clone()).await;
    Ok(meta)
}

//! Shared response cache handle.

use super::file::{CacheMap, load_entries, save_entries};
use crate::{Error, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Response cache handle.
///
/// Cloning is cheap and every clone shares the same map. Each `put` updates
/// the map and rewrites the backing file while holding the lock, so writers
/// are serialized.
#[derive(Clone, Debug)]
pub struct ResponseCache {
    entries: Arc<Mutex<CacheMap>>,
    path: Option<PathBuf>,
}

impl ResponseCache {
    /// Load the cache stored at `path`.
    ///
    /// Never fails: a missing or corrupt file gives an empty cache that will
    /// overwrite the file on the first `put`.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = load_entries(&path).await;
        Self { entries: Arc::new(Mutex::new(entries)), path: Some(path) }
    }

    /// Cache with no backing file. `flush` is a no-op.
    pub fn in_memory() -> Self {
        Self { entries: Arc::new(Mutex::new(CacheMap::new())), path: None }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up a response by exact URL string.
    pub async fn get(&self, url: &str) -> Option<Response> {
        self.entries.lock().await.get(url).cloned()
    }

    /// Store a response under `url` and persist the whole cache.
    ///
    /// On a write failure the entry stays in memory and `Error::CacheSave`
    /// is returned.
    pub async fn put(&self, url: &str, response: Response) -> Result<(), Error> {
        let mut entries = self.entries.lock().await;
        entries.insert(url.to_string(), response);
        self.write(&entries).await
    }

    /// Persist the current contents.
    pub async fn flush(&self) -> Result<(), Error> {
        let entries = self.entries.lock().await;
        self.write(&entries).await
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn write(&self, entries: &CacheMap) -> Result<(), Error> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        save_entries(path, entries)
            .await
            .map_err(|e| Error::CacheSave(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("flushed {} cached responses to {}", entries.len(), path.display());
        Ok(())
    }
}

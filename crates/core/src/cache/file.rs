//! Reading and writing the cache file.

use crate::Response;
use std::collections::BTreeMap;
use std::path::Path;

/// In-memory form of the cache file: request URL → final response.
pub type CacheMap = BTreeMap<String, Response>;

/// Read the cache file at `path`.
///
/// A missing file, an unreadable file, or content that is not a valid cache
/// document all yield an empty map. Load failures are never surfaced.
pub async fn load_entries(path: &Path) -> CacheMap {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no cache file at {}, starting empty", path.display());
            return CacheMap::new();
        }
        Err(e) => {
            tracing::warn!("failed to read cache file {}: {}", path.display(), e);
            return CacheMap::new();
        }
    };

    match serde_json::from_str::<CacheMap>(&data) {
        Ok(entries) => {
            tracing::debug!("loaded {} cached responses from {}", entries.len(), path.display());
            entries
        }
        Err(e) => {
            tracing::warn!("ignoring unparseable cache file {}: {}", path.display(), e);
            CacheMap::new()
        }
    }
}

/// Serialize the whole map and overwrite the file at `path`.
///
/// Missing parent directories are created.
pub async fn save_entries(path: &Path, entries: &CacheMap) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(entries).map_err(std::io::Error::other)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::write(path, json).await
}

//! Durable table snapshots
//!
//! Each materialized table is stored as one JSON Lines file named after its
//! key, one row per line. JSON keeps an absent value (`null`) apart from an
//! empty string, so a reloaded snapshot equals the rows that were saved. A
//! snapshot, once written, is returned as-is by later runs until it is removed.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use crate::app::cache::atomic::write_atomic;
use crate::app::cache::CacheConfig;
use crate::constants::cache;
use crate::errors::{Result, SnapshotError, SnapshotResult};

/// A snapshot present on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub key: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Keyed store of JSON Lines snapshots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the configured cache root
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::new(config.snapshot_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the snapshot for `key`
    ///
    /// Keys are restricted to ASCII alphanumerics, `_` and `-`.
    pub fn path(&self, key: &str) -> SnapshotResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SnapshotError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self
            .dir
            .join(format!("{}.{}", key, cache::SNAPSHOT_EXTENSION)))
    }

    pub fn exists(&self, key: &str) -> SnapshotResult<bool> {
        Ok(self.path(key)?.is_file())
    }

    /// Read every row of a snapshot
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> SnapshotResult<Vec<T>> {
        let path = self.path(key)?;
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| SnapshotError::Io { path, source: e })?;

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line))
            .collect::<std::result::Result<Vec<T>, _>>()
            .map_err(|e| SnapshotError::Json {
                key: key.to_string(),
                source: e,
            })
    }

    /// Replace the snapshot for `key` with `rows`
    pub async fn save<T: Serialize>(&self, key: &str, rows: &[T]) -> SnapshotResult<()> {
        let path = self.path(key)?;

        let mut content = Vec::new();
        for row in rows {
            serde_json::to_writer(&mut content, row).map_err(|e| SnapshotError::Json {
                key: key.to_string(),
                source: e,
            })?;
            content.push(b'\n');
        }

        write_atomic(&path, &content)
            .await
            .map_err(|e| SnapshotError::Io { path, source: e })?;
        debug!("Saved snapshot {} ({} rows)", key, rows.len());
        Ok(())
    }

    /// Delete a snapshot; returns false if there was none
    pub async fn remove(&self, key: &str) -> SnapshotResult<bool> {
        let path = self.path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Removed snapshot {}", key);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SnapshotError::Io { path, source: e }),
        }
    }

    /// Snapshots currently on disk, sorted by key
    pub async fn list(&self) -> SnapshotResult<Vec<SnapshotInfo>> {
        let mut snapshots = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(snapshots),
            Err(e) => {
                return Err(SnapshotError::Io {
                    path: self.dir.clone(),
                    source: e,
                })
            }
        };

        let io_error = |e| SnapshotError::Io {
            path: self.dir.clone(),
            source: e,
        };
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(cache::SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let size_bytes = entry.metadata().await.map_err(io_error)?.len();
            snapshots.push(SnapshotInfo {
                key,
                path,
                size_bytes,
            });
        }

        snapshots.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(snapshots)
    }

    /// Remove every snapshot, returning how many were deleted
    pub async fn clear(&self) -> SnapshotResult<usize> {
        let mut removed = 0;
        for snapshot in self.list().await? {
            if self.remove(&snapshot.key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Cache-aside over a snapshot
///
/// Returns the stored rows for `key` if a snapshot exists. Otherwise runs
/// `compute`, persists its rows under `key` and returns them. A failed
/// computation leaves any previous state untouched.
pub async fn memoize<T, F, Fut>(store: &SnapshotStore, key: &str, compute: F) -> Result<Vec<T>>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    if store.exists(key)? {
        debug!("Loading snapshot {}", key);
        return Ok(store.load(key).await?);
    }

    info!("No snapshot for {}, computing", key);
    let rows = compute().await?;
    store.save(key, &rows).await?;
    Ok(rows)
}

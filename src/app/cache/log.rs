//! Fetch log with replace-in-place semantics
//!
//! The log keeps one row per distinct URL. Updating a URL's row rewrites the
//! log with every other row preserved, so the read-modify-write must happen
//! under the owning cache's lock.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::errors::{CacheError, CacheResult};

use super::atomic::write_atomic;

/// One logged successful fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchLogEntry {
    /// Payload file name inside the requests directory
    pub filename: String,
    /// Source URL
    pub url: String,
    /// When the payload was fetched
    pub timestamp: DateTime<Utc>,
    /// HTTP status of the fetch
    pub status_code: u16,
}

/// CSV-backed fetch log
#[derive(Debug)]
pub struct FetchLog {
    path: PathBuf,
}

impl FetchLog {
    /// Create a handle for the log at `path`; the file is created on first upsert
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all rows; a missing log is empty
    pub async fn read(&self) -> CacheResult<Vec<FetchLogEntry>> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let mut reader = csv::Reader::from_reader(content.as_slice());
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<FetchLogEntry>, csv::Error>>()?;
        Ok(rows)
    }

    /// Find the row logged for `url`
    pub async fn find(&self, url: &str) -> CacheResult<Option<FetchLogEntry>> {
        Ok(self.read().await?.into_iter().find(|row| row.url == url))
    }

    /// Replace the row for `entry.url`, keeping every other row
    pub async fn upsert(&self, entry: FetchLogEntry) -> CacheResult<()> {
        let mut rows = match self.read().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    "Failed to read fetch log {}, creating new: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        };

        rows.retain(|row| row.url != entry.url);
        debug!("Logging fetch of {} ({} other rows)", entry.url, rows.len());
        rows.push(entry);

        self.write(&rows).await
    }

    /// Rewrite the whole log atomically
    async fn write(&self, rows: &[FetchLogEntry]) -> CacheResult<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let content = writer.into_inner().map_err(|e| CacheError::Io {
            path: self.path.clone(),
            source: e.into_error(),
        })?;

        write_atomic(&self.path, &content)
            .await
            .map_err(|e| CacheError::Io {
                path: self.path.clone(),
                source: e,
            })
    }
}

//! Content cache for raw fetched bytes
//!
//! Payloads are stored one file per URL under a deterministic key and are never
//! invalidated by the pipeline itself. Successful fetches are recorded in the
//! fetch log; the log's read-modify-write is the only step serialized by a lock,
//! payload writes for distinct URLs proceed independently.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::constants::cache;
use crate::errors::{CacheError, CacheResult};

use super::atomic::write_atomic;
use super::config::CacheConfig;
use super::log::{FetchLog, FetchLogEntry};
use super::path::CacheKey;
use super::stats::{CacheStats, DirectoryScanner};

/// A stored payload with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Source URL
    pub url: String,
    /// Key derived from the URL
    pub key: CacheKey,
    /// Raw payload
    pub bytes: Vec<u8>,
    /// Fetch time, if the fetch was logged
    pub fetched_at: Option<DateTime<Utc>>,
    /// HTTP status, if the fetch was logged
    pub status: Option<u16>,
}

/// URL-keyed payload store with an append/replace fetch log
#[derive(Debug)]
pub struct ContentCache {
    /// Directory holding payloads and the log
    requests_dir: PathBuf,
    /// Fetch log; the mutex serializes its read-modify-write
    log: Mutex<FetchLog>,
}

impl ContentCache {
    /// Create a content cache, creating its directory if needed
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the cache directory cannot be created or accessed
    pub async fn new(config: &CacheConfig) -> CacheResult<Self> {
        let requests_dir = config.requests_dir()?;
        Self::ensure_directory_exists(&requests_dir).await?;

        info!(
            "Initialized content cache at: {}",
            requests_dir.display()
        );

        let log = FetchLog::new(requests_dir.join(cache::LOG_FILE));
        Ok(Self {
            requests_dir,
            log: Mutex::new(log),
        })
    }

    /// Directory holding payloads and the log
    pub fn requests_dir(&self) -> &Path {
        &self.requests_dir
    }

    async fn ensure_directory_exists(path: &Path) -> CacheResult<()> {
        if !path.exists() {
            fs::create_dir_all(path).await.map_err(|e| {
                error!("Failed to create cache directory: {}", e);
                CacheError::DirectoryNotAccessible {
                    path: path.to_path_buf(),
                }
            })?;
            debug!("Created cache directory: {}", path.display());
        }
        Ok(())
    }

    /// Payload path for a URL
    pub fn payload_path(&self, url: &str) -> PathBuf {
        CacheKey::for_url(url).payload_path(&self.requests_dir)
    }

    /// Whether a payload exists for `url`
    pub async fn contains(&self, url: &str) -> bool {
        fs::try_exists(self.payload_path(url)).await.unwrap_or(false)
    }

    /// Stored bytes for `url`, or `None` if it was never fetched
    pub async fn get(&self, url: &str) -> CacheResult<Option<Vec<u8>>> {
        let path = self.payload_path(url);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }

    /// Stored payload together with its log row
    pub async fn entry(&self, url: &str) -> CacheResult<Option<CacheEntry>> {
        let Some(bytes) = self.get(url).await? else {
            return Ok(None);
        };

        let logged = {
            let log = self.log.lock().await;
            log.find(url).await?
        };

        Ok(Some(CacheEntry {
            url: url.to_string(),
            key: CacheKey::for_url(url),
            bytes,
            fetched_at: logged.as_ref().map(|row| row.timestamp),
            status: logged.map(|row| row.status_code),
        }))
    }

    /// Store `bytes` for `url` and record the fetch in the log
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the payload or the log cannot be written
    pub async fn put(&self, url: &str, bytes: &[u8], status: u16) -> CacheResult<CacheEntry> {
        let key = CacheKey::for_url(url);
        let path = key.payload_path(&self.requests_dir);

        write_atomic(&path, bytes)
            .await
            .map_err(|e| CacheError::Io {
                path: path.clone(),
                source: e,
            })?;

        let fetched_at = Utc::now();
        {
            let log = self.log.lock().await;
            log.upsert(FetchLogEntry {
                filename: key.file_name(),
                url: url.to_string(),
                timestamp: fetched_at,
                status_code: status,
            })
            .await?;
        }

        debug!("Cached {} bytes for {} as {}", bytes.len(), url, key);
        Ok(CacheEntry {
            url: url.to_string(),
            key,
            bytes: bytes.to_vec(),
            fetched_at: Some(fetched_at),
            status: Some(status),
        })
    }

    /// All fetch log rows
    pub async fn log_entries(&self) -> CacheResult<Vec<FetchLogEntry>> {
        let log = self.log.lock().await;
        log.read().await
    }

    /// Payload count, size and log row count
    pub async fn stats(&self) -> CacheResult<CacheStats> {
        let (cached_files_count, total_cache_size) =
            DirectoryScanner::scan_requests_directory(&self.requests_dir).await;
        let logged_urls = self.log_entries().await?.len();

        Ok(CacheStats {
            requests_dir: self.requests_dir.clone(),
            cached_files_count,
            total_cache_size,
            logged_urls,
        })
    }

    /// Remove every payload and the log; returns the number of files removed
    ///
    /// This is the out-of-band clearing path; the pipeline never calls it.
    pub async fn clear(&self) -> CacheResult<usize> {
        let _log = self.log.lock().await;
        let mut removed = 0;

        let mut entries = fs::read_dir(&self.requests_dir)
            .await
            .map_err(|e| CacheError::Io {
                path: self.requests_dir.clone(),
                source: e,
            })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| CacheError::Io {
            path: self.requests_dir.clone(),
            source: e,
        })? {
            let path = entry.path();
            if path.is_file() {
                fs::remove_file(&path)
                    .await
                    .map_err(|e| CacheError::Io { path, source: e })?;
                removed += 1;
            }
        }

        info!(
            "Cleared {} files from {}",
            removed,
            self.requests_dir.display()
        );
        Ok(removed)
    }
}

//! Cache statistics and disk usage
//!
//! Scans the requests directory for stored payloads and reports counts and
//! sizes alongside the number of logged URLs.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::constants::cache;

/// Content cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests directory that was scanned
    pub requests_dir: PathBuf,
    /// Number of payloads on disk
    pub cached_files_count: usize,
    /// Total size of payloads in bytes
    pub total_cache_size: u64,
    /// Rows in the fetch log
    pub logged_urls: usize,
}

impl CacheStats {
    /// Format cache size in human-readable format
    pub fn format_cache_size(&self) -> String {
        format_bytes(self.total_cache_size)
    }
}

/// Directory scanner for cache statistics
pub struct DirectoryScanner;

impl DirectoryScanner {
    /// Count payload files and their total size
    pub async fn scan_requests_directory(requests_dir: &Path) -> (usize, u64) {
        let requests_dir = requests_dir.to_path_buf();

        tokio::task::spawn_blocking(move || Self::scan_directory(&requests_dir))
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to scan cache directory: {}", e);
                (0, 0)
            })
    }

    fn scan_directory(dir: &Path) -> (usize, u64) {
        let mut file_count = 0;
        let mut total_size = 0u64;

        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() && Self::is_payload_file(&path) {
                    file_count += 1;
                    if let Ok(metadata) = entry.metadata() {
                        total_size += metadata.len();
                    }
                }
            }
        }

        (file_count, total_size)
    }

    /// Payloads carry the payload extension; temp files and the log do not
    fn is_payload_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == cache::PAYLOAD_EXTENSION)
            .unwrap_or(false)
    }
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

//! Cache configuration types and defaults
//!
//! This module contains the configuration structure for the content cache and
//! snapshot store, including resolution of the OS-specific default root.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::cache;
use crate::errors::{CacheError, CacheResult};

/// Configuration for the durable cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root directory for cache storage (OS-specific if None)
    pub cache_root: Option<PathBuf>,
}

impl CacheConfig {
    /// Create a new cache configuration with custom cache root
    pub fn with_cache_root(cache_root: PathBuf) -> Self {
        Self {
            cache_root: Some(cache_root),
        }
    }

    /// Resolve the cache root, falling back to the system cache directory
    ///
    /// - macOS: ~/Library/Caches/medreg-fetcher
    /// - Linux: ~/.cache/medreg-fetcher
    /// - Windows: %LOCALAPPDATA%/medreg-fetcher
    pub fn resolve_root(&self) -> CacheResult<PathBuf> {
        match &self.cache_root {
            Some(path) => Ok(path.clone()),
            None => dirs::cache_dir()
                .map(|dir| dir.join(cache::APP_DIR))
                .ok_or_else(|| CacheError::DirectoryNotAccessible {
                    path: PathBuf::from("system cache directory"),
                }),
        }
    }

    /// Directory holding raw fetched payloads and the fetch log
    pub fn requests_dir(&self) -> CacheResult<PathBuf> {
        Ok(self.resolve_root()?.join(cache::REQUESTS_DIR))
    }

    /// Directory holding materialized snapshots
    pub fn snapshot_dir(&self) -> CacheResult<PathBuf> {
        Ok(self.resolve_root()?.join(cache::SNAPSHOT_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.cache_root, None);
    }

    #[test]
    fn test_custom_root_layout() {
        let config = CacheConfig::with_cache_root(PathBuf::from("/tmp/medreg"));

        assert_eq!(config.resolve_root().unwrap(), PathBuf::from("/tmp/medreg"));
        assert_eq!(
            config.requests_dir().unwrap(),
            PathBuf::from("/tmp/medreg/requests")
        );
        assert_eq!(
            config.snapshot_dir().unwrap(),
            PathBuf::from("/tmp/medreg/snapshots")
        );
    }
}

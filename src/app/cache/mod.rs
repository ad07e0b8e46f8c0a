//! Durable content cache for fetched pages and documents
//!
//! Raw response bodies are stored once per URL and read back on every later
//! request for that URL, so repeated runs never touch the network for pages
//! they have already seen.
//!
//! # Module Organization
//!
//! - [`config`] - Cache root configuration and directory layout
//! - [`path`] - Deterministic URL → key derivation
//! - [`manager`] - The [`ContentCache`] itself
//! - [`log`] - Replace-in-place fetch log
//! - [`stats`] - Disk usage reporting
//! - [`atomic`] - Temp-file + rename writes shared with the snapshot store
//!
//! # Examples
//!
//! ```rust,no_run
//! use medreg_fetcher::app::cache::{CacheConfig, ContentCache};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = ContentCache::new(&CacheConfig::with_cache_root(PathBuf::from("/tmp/medreg"))).await?;
//!
//! let url = "https://ec.europa.eu/health/documents/community-register/html/h001.htm";
//! if cache.get(url).await?.is_none() {
//!     cache.put(url, b"<html></html>", 200).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod config;
pub mod log;
pub mod manager;
pub mod path;
pub mod stats;

#[cfg(test)]
mod tests;

// Re-export main public API
pub use config::CacheConfig;
pub use log::{FetchLog, FetchLogEntry};
pub use manager::{CacheEntry, ContentCache};
pub use path::CacheKey;
pub use stats::{format_bytes, CacheStats};

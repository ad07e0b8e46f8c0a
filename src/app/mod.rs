//! Core application logic for MedReg Fetcher
//!
//! This module contains the pipeline components: the content cache, the
//! cache-aware HTTP fetcher, the register crawler and detail page parser, and
//! the table materializer that memoizes the finished tables as snapshots.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use medreg_fetcher::app::{
//!     CacheConfig, ClientConfig, ContentCache, RegisterConfig, ResilientFetcher,
//!     SnapshotStore, TableMaterializer,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache_config = CacheConfig::default();
//! let cache = Arc::new(ContentCache::new(&cache_config).await?);
//! let fetcher = Arc::new(ResilientFetcher::new(ClientConfig::default(), cache)?);
//!
//! let materializer = TableMaterializer::new(
//!     fetcher,
//!     RegisterConfig::default(),
//!     SnapshotStore::from_config(&cache_config)?,
//! );
//!
//! let products = materializer.products().await?;
//! let procedures = materializer.procedures().await?;
//! println!("{} products, {} procedure rows", products.len(), procedures.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod embedded;
pub mod models;
pub mod register;
pub mod tables;

// Re-export main public API
pub use cache::{CacheConfig, CacheEntry, CacheStats, ContentCache, FetchLogEntry};
pub use client::{ClientConfig, FetchResponse, ResilientFetcher};
pub use models::{
    DetailFields, FieldTag, ListingRecord, ProcedureRecord, ProcedureTableRow, ProductRecord, ProductRef,
};
pub use register::{ConsistencyMerger, DetailPageEnricher, RegisterConfig, RegisterCrawler};
pub use tables::{memoize, SnapshotInfo, SnapshotStore, TableMaterializer};

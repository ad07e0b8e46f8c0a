//! Prelude module for MedReg Fetcher Library
//!
//! Re-exports the items needed for typical usage with a single
//! `use medreg_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use medreg_fetcher::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let (cache_config, client_config, register_config) = config.to_runtime_config();
//!
//!     let cache = Arc::new(ContentCache::new(&cache_config).await?);
//!     let fetcher = Arc::new(ResilientFetcher::new(client_config, cache)?);
//!     let store = SnapshotStore::from_config(&cache_config)?;
//!     let tables = TableMaterializer::new(fetcher, register_config, store);
//!
//!     let products = tables.products().await?;
//!     println!("{} products", products.len());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Configuration
pub use crate::config::AppConfig;

// Pipeline components
pub use crate::app::{
    CacheConfig, ClientConfig, ConsistencyMerger, ContentCache, DetailPageEnricher,
    RegisterConfig, RegisterCrawler, ResilientFetcher, SnapshotStore, TableMaterializer,
};

// Records
pub use crate::app::{
    DetailFields, ListingRecord, ProcedureRecord, ProcedureTableRow, ProductRecord, ProductRef,
};

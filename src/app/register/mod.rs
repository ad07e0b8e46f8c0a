//! Community register sources
//!
//! The module is organized into specialized components:
//! - `config`: register base URL and page naming
//! - `crawler`: paginated listing crawl
//! - `detail`: detail page fields and procedure history
//! - `merge`: listing and detail page reconciliation

pub mod config;
pub mod crawler;
pub mod detail;
pub mod merge;

pub use config::RegisterConfig;
pub use crawler::{RawListingEntry, RegisterCrawler};
pub use detail::DetailPageEnricher;
pub use merge::{merge_fields, ConsistencyMerger};

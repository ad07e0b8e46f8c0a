//! Application constants for MedReg Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Overrides the cache root directory
    pub const CACHE_DIR: &str = "MEDREG_CACHE_DIR";

    /// Overrides the register base URL
    pub const BASE_URL: &str = "MEDREG_BASE_URL";
}

/// Community register URLs and page conventions
pub mod register {
    /// Register base URL; listing and detail pages live under `html/`,
    /// procedure documents under `{year}/`
    pub const BASE_URL: &str = "https://ec.europa.eu/health/documents/community-register";

    /// Sub-path holding the HTML pages
    pub const HTML_PATH: &str = "html";

    /// Stem of the listing pages (`reg_hum_act.htm`, `reg_hum_act2.htm`, ...)
    pub const LISTING_STEM: &str = "reg_hum_act";

    /// Page file extension
    pub const PAGE_EXTENSION: &str = "htm";

    /// Path prefix letter of human medicine detail pages
    pub const DETAIL_PREFIX: &str = "h";

    /// Identifiers below this are zero-padded to three digits in detail URLs
    pub const PADDED_ID_LIMIT: i64 = 1000;

    /// Default number of products enriched concurrently
    pub const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 1;
}

/// JavaScript variables holding the embedded JSON arrays
pub mod variables {
    /// Listing page array
    pub const LISTING: &str = "dataSet";

    /// Detail page top-level fields
    pub const PRODUCT_INFORMATION: &str = "dataSet_product_information";

    /// Detail page procedure history
    pub const PROCEDURES: &str = "dataSet_proc";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "MedReg-Fetcher/0.1.0 (Register Research Tool)";

    /// Per-attempt request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Status code counted as success
    pub const STATUS_OK: u16 = 200;
}

/// Retry configuration
pub mod limits {
    /// Maximum attempts per fetch
    pub const MAX_RETRIES: u32 = 3;

    /// Delay between attempts (milliseconds); zero means retry immediately
    pub const RETRY_DELAY_MS: u64 = 0;

    /// Statuses treated as permanent unless retrying them is configured
    pub const PERMANENT_STATUSES: [u16; 2] = [404, 410];
}

/// Cache layout constants
pub mod cache {
    /// Application directory name under the OS cache directory
    pub const APP_DIR: &str = "medreg-fetcher";

    /// Sub-directory holding raw fetched payloads
    pub const REQUESTS_DIR: &str = "requests";

    /// Fetch log file name inside the requests directory
    pub const LOG_FILE: &str = "request_log.csv";

    /// Payload file extension
    pub const PAYLOAD_EXTENSION: &str = "html";

    /// Hex characters of the URL digest kept in a cache key
    pub const KEY_HASH_LEN: usize = 16;

    /// Maximum length of the human-readable key prefix
    pub const KEY_PREFIX_LEN: usize = 25;

    /// Sub-directory holding snapshots
    pub const SNAPSHOT_DIR: &str = "snapshots";

    /// Snapshot file extension (JSON Lines, one row per line)
    pub const SNAPSHOT_EXTENSION: &str = "jsonl";
}

/// Snapshot keys of the materialized tables
pub mod snapshots {
    /// Flattened listing crawl
    pub const LISTING: &str = "register_listing";

    /// Merged product table
    pub const PRODUCTS: &str = "medicines_register";

    /// Exploded procedure table
    pub const PROCEDURES: &str = "procedures";
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "medreg-fetcher.toml";

    /// Configuration file name inside the user config directory
    pub const USER_CONFIG_FILE: &str = "config.toml";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use http::USER_AGENT;
pub use limits::MAX_RETRIES;
pub use register::BASE_URL as REGISTER_BASE_URL;

//! Error types for MedReg Fetcher
//!
//! This module defines the error types for every stage of the pipeline: network
//! retrieval, the content cache, embedded-data parsing, snapshots and configuration.
//! Errors carry enough context (URL, path, product id) to be actionable without a
//! debugger.

use std::path::PathBuf;
use thiserror::Error;

/// Network retrieval errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network-level failure on the final permitted attempt
    #[error("Transport failure fetching {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Every attempt completed but none returned HTTP 200
    #[error("Exhausted {attempts} attempts fetching {url} (last status: {last_status:?})")]
    ExhaustedRetries {
        url: String,
        attempts: u32,
        last_status: Option<u16>,
    },

    /// The URL could not be parsed
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// Persisting the response failed
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl FetchError {
    /// True if the upstream answered, just never with 200
    pub fn is_exhausted(&self) -> bool {
        matches!(self, FetchError::ExhaustedRetries { .. })
    }
}

/// Content cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache directory not found or inaccessible
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },

    /// I/O failure on a cache file
    #[error("Cache I/O failed on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fetch log could not be written
    #[error("Fetch log serialization failed")]
    Log(#[from] csv::Error),
}

/// Embedded JSON parsing errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// The embedded array was found but is not valid JSON of the expected shape
    #[error("Invalid JSON in embedded array `{variable}`")]
    Json {
        variable: String,
        #[source]
        source: serde_json::Error,
    },

    /// A listing entry carries an identifier that is not an integer
    #[error("Invalid product identifier: {value}")]
    InvalidIdentifier { value: String },
}

/// Snapshot store errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// I/O failure on a snapshot file
    #[error("Snapshot I/O failed on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot rows could not be (de)serialized
    #[error("Snapshot `{key}` could not be encoded or decoded")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid snapshot key
    #[error("Invalid snapshot key: {key}")]
    InvalidKey { key: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read or written
    #[error("Configuration file I/O failed on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Configuration could not be serialized")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Retrieval error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Parse error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Snapshot error
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Listing and detail page disagree on a shared field
    #[error(
        "Consistency violation for product {product_id}: field `{field}` is {listing:?} in the listing but {detail:?} on the detail page"
    )]
    ConsistencyViolation {
        product_id: i64,
        field: &'static str,
        listing: String,
        detail: String,
    },

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    ///
    /// Only transport failures qualify: a later run may succeed where this one
    /// did not. Everything else needs either a code fix or manual review.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Fetch(FetchError::Transport { .. }))
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "fetch",
            AppError::Cache(_) => "cache",
            AppError::Parse(_) => "parse",
            AppError::Snapshot(_) => "snapshot",
            AppError::Config(_) => "config",
            AppError::ConsistencyViolation { .. } => "consistency",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Parse result type alias
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Snapshot result type alias
pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

//! MedReg Fetcher Library
//!
//! A Rust library for harvesting the EU community register of medicinal
//! products into tabular form. Pages are fetched through a durable content
//! cache and the resulting tables are memoized as snapshots, so repeated runs
//! only touch the network for pages never seen before.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(MAX_RETRIES, 3);
        assert_eq!(env::CACHE_DIR, "MEDREG_CACHE_DIR");
        assert!(USER_AGENT.contains("MedReg-Fetcher"));
        assert!(REGISTER_BASE_URL.starts_with("https://"));
    }

    #[test]
    fn test_error_types() {
        let app_error = AppError::ConsistencyViolation {
            product_id: 1,
            field: "name",
            listing: "X".to_string(),
            detail: "Y".to_string(),
        };

        assert_eq!(app_error.category(), "consistency");
        assert!(!app_error.is_recoverable());
    }
}

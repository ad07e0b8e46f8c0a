//! Register location and page naming
//!
//! All URLs the pipeline requests are derived here from one base URL, so a
//! test server or mirror only needs to override `base_url`.

use serde::{Deserialize, Serialize};

use crate::app::models::ProductRef;
use crate::constants::register;

/// Configuration of the register source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterConfig {
    /// Register base URL (without trailing slash)
    pub base_url: String,
    /// Stem of the listing page names
    pub listing_stem: String,
    /// Prefix letter of detail page names
    pub detail_prefix: String,
    /// Products enriched concurrently; 1 keeps enrichment strictly sequential
    pub enrichment_concurrency: usize,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            base_url: register::BASE_URL.to_string(),
            listing_stem: register::LISTING_STEM.to_string(),
            detail_prefix: register::DETAIL_PREFIX.to_string(),
            enrichment_concurrency: register::DEFAULT_ENRICHMENT_CONCURRENCY,
        }
    }
}

impl RegisterConfig {
    /// Configuration pointing at another base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Listing page `page` (1-based); page 1 carries no number
    pub fn listing_url(&self, page: u32) -> String {
        let suffix = if page <= 1 {
            String::new()
        } else {
            page.to_string()
        };
        format!(
            "{}/{}/{}{}.{}",
            self.base(),
            register::HTML_PATH,
            self.listing_stem,
            suffix,
            register::PAGE_EXTENSION
        )
    }

    /// Detail page of a product
    pub fn detail_url(&self, product: &ProductRef) -> String {
        format!(
            "{}/{}/{}{}.{}",
            self.base(),
            register::HTML_PATH,
            self.detail_prefix,
            product,
            register::PAGE_EXTENSION
        )
    }

    /// Directory holding the documents of one procedure decision
    ///
    /// `date_digits` is the decision date with separators removed (`20200315`).
    pub fn document_base(&self, year: &str, date_digits: &str, procedure_id: &str) -> String {
        format!("{}/{}/{}{}", self.base(), year, date_digits, procedure_id)
    }
}

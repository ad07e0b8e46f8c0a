//! Paginated crawl of the register listing
//!
//! The listing has no page count. Pages are requested in order until one is
//! missing (the fetch never returns 200) or carries no embedded listing array;
//! either is the normal end of the listing. Each page's entries are appended
//! to the result before the next page is requested.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::app::client::ResilientFetcher;
use crate::app::embedded::extract_array;
use crate::app::models::{
    normalize_indication, nullable_string, parse_identifier, ListingRecord,
};
use crate::constants::{http, variables};
use crate::errors::{ParseError, Result};

use super::config::RegisterConfig;

/// Listing entry as embedded in the page
#[derive(Debug, Clone, Deserialize)]
pub struct RawListingEntry {
    pub eu_num: RawEuNumber,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub inn: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub indication: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub company: String,
}

/// Nested EU numbering structure of a listing entry
#[derive(Debug, Clone, Deserialize)]
pub struct RawEuNumber {
    #[serde(default, deserialize_with = "nullable_string")]
    pub display: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub pre: String,
    pub id: Value,
}

impl TryFrom<RawListingEntry> for ListingRecord {
    type Error = ParseError;

    fn try_from(raw: RawListingEntry) -> std::result::Result<Self, Self::Error> {
        Ok(ListingRecord {
            id: parse_identifier(&raw.eu_num.id)?,
            eu_number: raw.eu_num.display,
            pre: raw.eu_num.pre,
            name: raw.name,
            inn: raw.inn,
            indication: normalize_indication(&raw.indication),
            company: raw.company,
        })
    }
}

/// Walks the listing pages of the register
#[derive(Debug, Clone)]
pub struct RegisterCrawler {
    fetcher: Arc<ResilientFetcher>,
    config: RegisterConfig,
}

impl RegisterCrawler {
    pub fn new(fetcher: Arc<ResilientFetcher>, config: RegisterConfig) -> Self {
        Self { fetcher, config }
    }

    /// Fetch every listing page and concatenate the raw entries
    ///
    /// # Errors
    ///
    /// Transport failures, cache failures and undecodable listing arrays abort
    /// the crawl. A missing page ends it.
    pub async fn crawl_pages(&self) -> Result<Vec<RawListingEntry>> {
        let mut entries = Vec::new();
        let mut page = 1;

        loop {
            let url = self.config.listing_url(page);
            let response = match self.fetcher.get(&url).await {
                Ok(response) => response,
                Err(e) if e.is_exhausted() => {
                    debug!("Stopped traversing at page {} as it did not exist", page);
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            if response.status != http::STATUS_OK {
                debug!("Stopped traversing at page {} (HTTP {})", page, response.status);
                break;
            }

            let Some(page_entries) = extract_array::<RawListingEntry>(
                &response.text(),
                variables::LISTING,
                true,
            )?
            else {
                debug!("No match on page {}", page);
                break;
            };

            debug!("Page {} yielded {} entries", page, page_entries.len());
            entries.extend(page_entries);
            page += 1;
        }

        info!(
            "Crawled {} listing entries from {} pages",
            entries.len(),
            page - 1
        );
        Ok(entries)
    }

    /// Crawl the listing and flatten every entry
    pub async fn crawl(&self) -> Result<Vec<ListingRecord>> {
        let raw = self.crawl_pages().await?;
        let records = raw
            .into_iter()
            .map(ListingRecord::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

//! Cache-aware HTTP retrieval for the community register
//!
//! [`ResilientFetcher`] is the single network access point of the pipeline.
//! A URL already present in the content cache is served from disk without any
//! network access; otherwise the page is fetched with bounded retries and the
//! body is persisted before it is returned.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: GET with bounded retries

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::app::cache::ContentCache;
use crate::constants::http::STATUS_OK;
use crate::errors::{FetchError, FetchResult};

pub mod config;
pub mod http;

pub use config::ClientConfig;

use self::http::HttpHandler;

/// Body and status of a fetched URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Requested URL
    pub url: String,
    /// Raw body
    pub bytes: Vec<u8>,
    /// HTTP status; cache hits report 200
    pub status: u16,
    /// True if served from the content cache
    pub from_cache: bool,
}

impl FetchResponse {
    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// GET-with-retry over the content cache
#[derive(Debug)]
pub struct ResilientFetcher {
    http_handler: HttpHandler,
    cache: Arc<ContentCache>,
}

impl ResilientFetcher {
    /// Creates a fetcher over `cache`
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the HTTP client cannot be built
    pub fn new(config: ClientConfig, cache: Arc<ContentCache>) -> FetchResult<Self> {
        let http_handler = HttpHandler::new(config)?;
        Ok(Self {
            http_handler,
            cache,
        })
    }

    /// The content cache backing this fetcher
    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Client configuration in use
    pub fn config(&self) -> &ClientConfig {
        self.http_handler.config()
    }

    /// Fetch `url`, serving it from the cache unless `force` is set
    ///
    /// On a network fetch at most `max_retries` attempts are made; the first
    /// 200 response is stored in the cache and logged before it is returned.
    ///
    /// # Errors
    ///
    /// - `FetchError::InvalidUrl` if `url` does not parse
    /// - `FetchError::Transport` if the final attempt fails at network level
    /// - `FetchError::ExhaustedRetries` if no attempt returned 200
    /// - `FetchError::Cache` if the response cannot be persisted
    pub async fn fetch(&self, url: &str, force: bool, max_retries: u32) -> FetchResult<FetchResponse> {
        Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            error: e.to_string(),
        })?;

        if !force {
            if let Some(bytes) = self.cache.get(url).await? {
                debug!("Cache hit for {}", url);
                return Ok(FetchResponse {
                    url: url.to_string(),
                    bytes,
                    status: STATUS_OK,
                    from_cache: true,
                });
            }
        }

        let bytes = self.http_handler.get_with_retries(url, max_retries).await?;
        self.cache.put(url, &bytes, STATUS_OK).await?;

        Ok(FetchResponse {
            url: url.to_string(),
            bytes,
            status: STATUS_OK,
            from_cache: false,
        })
    }

    /// Fetch `url` through the cache with the configured retry bound
    pub async fn get(&self, url: &str) -> FetchResult<FetchResponse> {
        self.fetch(url, false, self.config().max_retries).await
    }

    /// Fetch a linked document (decision or annex PDF) through the cache
    pub async fn fetch_document(&self, url: &str) -> FetchResult<Vec<u8>> {
        Ok(self.get(url).await?.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::cache::CacheConfig;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_fetcher() -> (TempDir, ResilientFetcher) {
        let temp_dir = TempDir::new().unwrap();
        let cache = ContentCache::new(&CacheConfig::with_cache_root(temp_dir.path().to_path_buf()))
            .await
            .unwrap();
        let fetcher = ResilientFetcher::new(ClientConfig::default(), Arc::new(cache)).unwrap();
        (temp_dir, fetcher)
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/h001.htm"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>detail</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, fetcher) = create_fetcher().await;
        let url = format!("{}/html/h001.htm", server.uri());

        let first = fetcher.get(&url).await.unwrap();
        assert!(!first.from_cache);
        let second = fetcher.get(&url).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.status, 200);
        assert_eq!(second.text(), "<html>detail</html>");
    }

    #[tokio::test]
    async fn test_force_refetches_and_replaces_log_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/h002.htm"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
            .expect(2)
            .mount(&server)
            .await;

        let (_dir, fetcher) = create_fetcher().await;
        let url = format!("{}/html/h002.htm", server.uri());

        fetcher.get(&url).await.unwrap();
        let forced = fetcher.fetch(&url, true, 3).await.unwrap();
        assert!(!forced.from_cache);

        let rows = fetcher.cache().log_entries().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].url, url);
        assert_eq!(rows[0].status_code, 200);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/h003.htm"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let (_dir, fetcher) = create_fetcher().await;
        let url = format!("{}/html/h003.htm", server.uri());

        let err = fetcher.fetch(&url, false, 2).await.unwrap_err();
        assert!(err.is_exhausted());
        assert!(fetcher.cache().get(&url).await.unwrap().is_none());
        assert!(fetcher.cache().log_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let (_dir, fetcher) = create_fetcher().await;
        let err = fetcher.get("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}

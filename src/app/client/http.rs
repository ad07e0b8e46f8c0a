//! Core HTTP operations with bounded retries
//!
//! An attempt succeeds only on HTTP 200. Transport failures are retried
//! silently until the final attempt, whose failure propagates. Attempts that
//! complete with any other status simply move on to the next attempt; when
//! none succeeds the caller gets `ExhaustedRetries`, distinct from a transport
//! failure.

use reqwest::Client;
use tracing::{debug, warn};

use crate::constants::http;
use crate::errors::{FetchError, FetchResult};

use super::config::ClientConfig;

/// HTTP operations handler with retry logic
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    config: ClientConfig,
}

/// Outcome of one completed request
enum Attempt {
    Ok(Vec<u8>),
    Status(u16),
}

impl HttpHandler {
    /// Creates a new HttpHandler from configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> FetchResult<Self> {
        let client = config.build_http_client()?;
        Ok(Self { client, config })
    }

    /// Client configuration in use
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET `url` with up to `max_retries` attempts, returning the body of the
    /// first 200 response
    ///
    /// # Errors
    ///
    /// - `FetchError::Transport` if the final attempt fails at network level
    /// - `FetchError::ExhaustedRetries` if every attempt returned a non-200 status
    pub async fn get_with_retries(&self, url: &str, max_retries: u32) -> FetchResult<Vec<u8>> {
        let mut last_status = None;
        let mut attempts = 0;

        while attempts < max_retries {
            attempts += 1;

            match self.attempt(url).await {
                Ok(Attempt::Ok(body)) => {
                    debug!("Fetched {} ({} bytes, attempt {})", url, body.len(), attempts);
                    return Ok(body);
                }
                Ok(Attempt::Status(status)) => {
                    debug!("{} answered HTTP {} (attempt {})", url, status, attempts);
                    last_status = Some(status);
                    if self.config.is_permanent(status) {
                        break;
                    }
                }
                Err(e) if attempts >= max_retries => {
                    warn!("Attempt {} on {} failed: {}", attempts, url, e);
                    return Err(FetchError::Transport {
                        url: url.to_string(),
                        source: e,
                    });
                }
                Err(_) => {}
            }

            if attempts < max_retries && !self.config.retry_delay.is_zero() {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(FetchError::ExhaustedRetries {
            url: url.to_string(),
            attempts,
            last_status,
        })
    }

    async fn attempt(&self, url: &str) -> Result<Attempt, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        if status != http::STATUS_OK {
            return Ok(Attempt::Status(status));
        }
        let body = response.bytes().await?;
        Ok(Attempt::Ok(body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handler() -> HttpHandler {
        HttpHandler::new(ClientConfig {
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page.htm"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let body = handler()
            .get_with_retries(&format!("{}/page.htm", server.uri()), 3)
            .await
            .unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn test_non_200_is_retried_until_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy.htm"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let err = handler()
            .get_with_retries(&format!("{}/busy.htm", server.uri()), 3)
            .await
            .unwrap_err();

        match err {
            FetchError::ExhaustedRetries {
                attempts,
                last_status,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_status, Some(503));
            }
            other => panic!("Expected ExhaustedRetries, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_found_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.htm"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = handler()
            .get_with_retries(&format!("{}/missing.htm", server.uri()), 3)
            .await
            .unwrap_err();
        assert!(err.is_exhausted());
    }

    #[tokio::test]
    async fn test_not_found_retried_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.htm"))
            .respond_with(ResponseTemplate::new(404))
            .expect(3)
            .mount(&server)
            .await;

        let handler = HttpHandler::new(ClientConfig {
            retry_not_found: true,
            ..Default::default()
        })
        .unwrap();
        let err = handler
            .get_with_retries(&format!("{}/missing.htm", server.uri()), 3)
            .await
            .unwrap_err();
        assert!(err.is_exhausted());
    }

    #[tokio::test]
    async fn test_recovers_after_transient_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky.htm"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky.htm"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let body = handler()
            .get_with_retries(&format!("{}/flaky.htm", server.uri()), 3)
            .await
            .unwrap();
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        // Nothing listens on port 9 of localhost
        let err = handler()
            .get_with_retries("http://127.0.0.1:9/unreachable.htm", 2)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}

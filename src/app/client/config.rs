//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP client
//! used against the community register.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{http, limits};
use crate::errors::{FetchError, FetchResult};

/// Configuration for HTTP retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-attempt request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Attempts per fetch
    pub max_retries: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
    /// Keep retrying on 404/410 instead of giving up after the first one
    pub retry_not_found: bool,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            max_retries: limits::MAX_RETRIES,
            retry_delay: Duration::from_millis(limits::RETRY_DELAY_MS),
            retry_not_found: false,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> FetchResult<Client> {
        let mut client_builder = Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str());

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder.build().map_err(FetchError::Client)
    }

    /// Whether `status` should end the retry loop early
    pub fn is_permanent(&self, status: u16) -> bool {
        !self.retry_not_found && limits::PERMANENT_STATUSES.contains(&status)
    }
}

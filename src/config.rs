//! Configuration management for MedReg Fetcher
//!
//! This module provides unified configuration management with multi-source
//! loading and zero-config defaults. The TOML-facing structs here are converted
//! into the runtime configuration of each pipeline component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::{CacheConfig, ClientConfig, RegisterConfig};
use crate::constants::{cache, env, files, http, limits, logging, register};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Cache settings
    pub cache: CacheConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Register source settings
    pub register: RegisterConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Cache directory path (system cache directory if unset)
    pub cache_root: Option<PathBuf>,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Per-attempt request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Attempts per fetch
    pub max_retries: u32,
    /// Delay between attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Keep retrying on 404/410
    pub retry_not_found: bool,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
            max_retries: limits::MAX_RETRIES,
            retry_delay_ms: limits::RETRY_DELAY_MS,
            retry_not_found: false,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

/// TOML-friendly register configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfigToml {
    /// Register base URL
    pub base_url: String,
    /// Stem of the listing page names
    pub listing_stem: String,
    /// Prefix letter of detail page names
    pub detail_prefix: String,
    /// Products enriched concurrently
    pub enrichment_concurrency: usize,
}

impl Default for RegisterConfigToml {
    fn default() -> Self {
        Self {
            base_url: register::BASE_URL.to_string(),
            listing_stem: register::LISTING_STEM.to_string(),
            detail_prefix: register::DETAIL_PREFIX.to_string(),
            enrichment_concurrency: register::DEFAULT_ENRICHMENT_CONCURRENCY,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (CacheConfig, ClientConfig, RegisterConfig) {
        (
            self.cache.to_runtime_config(),
            self.client.to_runtime_config(),
            self.register.to_runtime_config(),
        )
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit path, else the first standard location found)
    /// 3. Environment variables
    ///
    /// CLI flags are applied by the caller afterwards.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Self::load_from_file(&path).await?
            }
            None => match Self::find_config_file() {
                Some(path) => Self::load_from_file(&path).await?,
                None => {
                    debug!("No config file found in standard locations");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(env::CACHE_DIR).filter(|v| !v.is_empty()) {
            debug!("Cache directory overridden by {}", env::CACHE_DIR);
            self.cache.cache_root = Some(PathBuf::from(dir));
        }
        if let Some(url) = lookup(env::BASE_URL).filter(|v| !v.is_empty()) {
            debug!("Register base URL overridden by {}", env::BASE_URL);
            self.register.base_url = url;
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.client.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.max_retries".to_string(),
                value: "0".to_string(),
                reason: "At least one attempt is required".to_string(),
            });
        }
        if self.register.enrichment_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "register.enrichment_concurrency".to_string(),
                value: "0".to_string(),
                reason: "Use 1 for sequential enrichment".to_string(),
            });
        }
        if let Err(e) = Url::parse(&self.register.base_url) {
            return Err(ConfigError::InvalidValue {
                field: "register.base_url".to_string(),
                value: self.register.base_url.clone(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// Write a commented default configuration file
    ///
    /// Writes to `path` or the user config location. An existing file is only
    /// replaced when `force` is set.
    pub async fn init(path: Option<PathBuf>, force: bool) -> ConfigResult<PathBuf> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if config_path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "path".to_string(),
                value: config_path.display().to_string(),
                reason: "File exists; pass --force to overwrite".to_string(),
            });
        }

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| ConfigError::Io {
                path: config_path.clone(),
                source: e,
            })?;

        info!("Created configuration file: {}", config_path.display());
        Ok(config_path)
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(files::LOCAL_CONFIG_FILE)];
        if let Ok(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        search_paths.into_iter().find(|path| {
            let found = path.exists();
            if found {
                debug!("Found config file: {}", path.display());
            }
            found
        })
    }

    /// Default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: PathBuf::from("user config directory"),
        })?;

        Ok(config_dir.join(cache::APP_DIR).join(files::USER_CONFIG_FILE))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# MedReg Fetcher Configuration
# Every setting is optional; omitted values fall back to the defaults below.

[cache]
# Cache directory (leave unset to use the system cache directory)
# cache_root = "/path/to/custom/cache"

[client]
# Per-attempt timeout and connection settings
request_timeout_secs = {timeout}
connect_timeout_secs = {connect}
pool_idle_timeout_secs = {idle}

# Attempts per page; only HTTP 200 counts as success
max_retries = {retries}
retry_delay_ms = {delay}

# Retry 404/410 responses as well instead of stopping at the first one
retry_not_found = false

user_agent = "{agent}"

[register]
base_url = "{base}"
listing_stem = "{stem}"
detail_prefix = "{prefix}"

# Products enriched concurrently (1 = strictly sequential)
enrichment_concurrency = {concurrency}

[logging]
level = "{level}"  # error, warn, info, debug, trace
"#,
            timeout = http::DEFAULT_TIMEOUT.as_secs(),
            connect = http::CONNECT_TIMEOUT.as_secs(),
            idle = http::POOL_IDLE_TIMEOUT.as_secs(),
            retries = limits::MAX_RETRIES,
            delay = limits::RETRY_DELAY_MS,
            agent = http::USER_AGENT,
            base = register::BASE_URL,
            stem = register::LISTING_STEM,
            prefix = register::DETAIL_PREFIX,
            concurrency = register::DEFAULT_ENRICHMENT_CONCURRENCY,
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}

impl CacheConfigToml {
    /// Convert to runtime CacheConfig
    pub fn to_runtime_config(&self) -> CacheConfig {
        CacheConfig {
            cache_root: self.cache_root.clone(),
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            retry_not_found: self.retry_not_found,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl RegisterConfigToml {
    /// Convert to runtime RegisterConfig
    pub fn to_runtime_config(&self) -> RegisterConfig {
        RegisterConfig {
            base_url: self.base_url.clone(),
            listing_stem: self.listing_stem.clone(),
            detail_prefix: self.detail_prefix.clone(),
            enrichment_concurrency: self.enrichment_concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.client.max_retries, 3);
        assert_eq!(config.client.retry_delay_ms, 0);
        assert!(!config.client.retry_not_found);
        assert_eq!(config.register.enrichment_concurrency, 1);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_file_matches_defaults() {
        let content = AppConfig::generate_default_config_content();
        let parsed: AppConfig = toml::from_str(&content).unwrap();

        assert_eq!(parsed, AppConfig::default());
        assert!(content.contains("[register]"));
    }

    #[tokio::test]
    async fn test_explicit_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = AppConfig::load(Some(temp_dir.path().join("missing.toml"))).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        tokio::fs::write(
            &path,
            "[client]\nmax_retries = 5\n\n[register]\nenrichment_concurrency = 4\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.client.max_retries, 5);
        assert_eq!(config.register.enrichment_concurrency, 4);
        assert_eq!(config.register.base_url, register::BASE_URL);
        assert_eq!(config.client.request_timeout_secs, 60);
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(|name| match name {
            "MEDREG_CACHE_DIR" => Some("/tmp/medreg".to_string()),
            "MEDREG_BASE_URL" => Some("http://localhost:9000".to_string()),
            _ => None,
        });

        let (cache, _, register) = config.to_runtime_config();
        assert_eq!(cache.cache_root, Some(PathBuf::from("/tmp/medreg")));
        assert_eq!(register.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = AppConfig::default();
        config.client.max_retries = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.register.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let written = AppConfig::init(Some(path.clone()), false).await.unwrap();
        assert_eq!(written, path);
        assert!(AppConfig::init(Some(path.clone()), false).await.is_err());
        assert!(AppConfig::init(Some(path), true).await.is_ok());
    }
}

//! Cache key derivation
//!
//! Every URL maps to exactly one cache key: a short prefix taken from the last
//! path segment (so a directory listing stays readable) joined to a truncated
//! SHA-256 digest of the full URL.

use std::fmt;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::constants::cache;

/// Deterministic cache key for a source URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a URL
    ///
    /// `https://host/html/reg_hum_act2.htm` becomes `reg_hum_act2_<16 hex chars>`.
    pub fn for_url(url: &str) -> Self {
        let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
        let hash = &digest[..cache::KEY_HASH_LEN];

        let prefix: String = url
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .split('.')
            .next()
            .unwrap_or_default()
            .chars()
            .take(cache::KEY_PREFIX_LEN)
            .collect();

        Self(format!("{}_{}", prefix, hash))
    }

    /// The key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the payload stored under this key
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, cache::PAYLOAD_EXTENSION)
    }

    /// Full payload path below a requests directory
    pub fn payload_path(&self, requests_dir: &Path) -> PathBuf {
        requests_dir.join(self.file_name())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let url = "https://ec.europa.eu/health/documents/community-register/html/h001.htm";
        assert_eq!(CacheKey::for_url(url), CacheKey::for_url(url));
    }

    #[test]
    fn test_key_prefix_and_hash_shape() {
        let key = CacheKey::for_url("https://example.org/html/reg_hum_act2.htm");
        let (prefix, hash) = key.as_str().rsplit_once('_').unwrap();

        assert_eq!(prefix, "reg_hum_act2");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_distinct_urls_get_distinct_keys() {
        let a = CacheKey::for_url("https://example.org/html/h001.htm");
        let b = CacheKey::for_url("https://example.org/html/h002.htm");
        assert_ne!(a, b);
    }

    #[test]
    fn test_long_prefix_is_truncated() {
        let key = CacheKey::for_url(
            "https://example.org/2020/20200315C123/anx_C123_en_with_a_very_long_name.pdf",
        );
        let prefix = key.as_str().rsplit_once('_').unwrap().0;
        assert_eq!(prefix.chars().count(), 25);
    }

    #[test]
    fn test_payload_path() {
        let key = CacheKey::for_url("https://example.org/html/h001.htm");
        let path = key.payload_path(Path::new("/cache/requests"));

        assert!(path.starts_with("/cache/requests"));
        assert_eq!(path.extension().unwrap(), "html");
    }
}

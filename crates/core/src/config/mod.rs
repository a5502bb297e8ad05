//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (DOCMIRROR_*)
//! 2. TOML config file (if DOCMIRROR_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Default documentation site mirrored when nothing else is configured.
pub const DEFAULT_DOCS_BASE_URL: &str = "https://docs.reccehq.com";

/// Days a crawled generation stays fresh.
pub const DEFAULT_TTL_DAYS: u32 = 7;

/// Concurrent page fetches per sync.
pub const DEFAULT_CRAWL_CONCURRENCY: usize = 5;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (DOCMIRROR_*)
/// 2. TOML config file (if DOCMIRROR_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the page cache database.
    ///
    /// Set via DOCMIRROR_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Days before the cached generation is considered stale.
    ///
    /// Set via DOCMIRROR_TTL_DAYS environment variable.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,

    /// Base URL of the documentation site; its `/sitemap.xml` drives crawling.
    ///
    /// Set via DOCMIRROR_DOCS_BASE_URL environment variable.
    #[serde(default = "default_docs_base_url")]
    pub docs_base_url: String,

    /// Maximum number of pages fetched at once during a sync.
    ///
    /// Set via DOCMIRROR_CRAWL_CONCURRENCY environment variable.
    #[serde(default = "default_crawl_concurrency")]
    pub crawl_concurrency: usize,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via DOCMIRROR_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via DOCMIRROR_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via DOCMIRROR_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./docmirror-cache")
}

fn default_ttl_days() -> u32 {
    DEFAULT_TTL_DAYS
}

fn default_docs_base_url() -> String {
    DEFAULT_DOCS_BASE_URL.into()
}

fn default_crawl_concurrency() -> usize {
    DEFAULT_CRAWL_CONCURRENCY
}

fn default_user_agent() -> String {
    "docmirror/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            ttl_days: default_ttl_days(),
            docs_base_url: default_docs_base_url(),
            crawl_concurrency: default_crawl_concurrency(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `DOCMIRROR_`
    /// 2. TOML file from `DOCMIRROR_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("DOCMIRROR_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("DOCMIRROR_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from("./docmirror-cache"));
        assert_eq!(config.ttl_days, 7);
        assert_eq!(config.docs_base_url, "https://docs.reccehq.com");
        assert_eq!(config.crawl_concurrency, 5);
        assert_eq!(config.user_agent, "docmirror/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_bytes, 5_242_880);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string("ttl_days = 3\ncache_dir = \"/tmp/docs\""));
        let config: AppConfig = figment.extract().unwrap();
        assert_eq!(config.ttl_days, 3);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/docs"));
        assert_eq!(config.crawl_concurrency, 5);
    }
}

//! Configuration validation rules.
//!
//! Checks `AppConfig` values after they have been loaded from environment,
//! files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when `cache_dir` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `ttl_days` exceeds ten years
    /// - `docs_base_url` is not an absolute http(s) URL
    /// - `crawl_concurrency` is outside 1..=64
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_dir".into(),
                hint: "Set DOCMIRROR_CACHE_DIR environment variable".into(),
            });
        }

        if self.ttl_days > 3650 {
            return Err(ConfigError::Invalid { field: "ttl_days".into(), reason: "must not exceed 3650".into() });
        }

        match url::Url::parse(&self.docs_base_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => {}
            Ok(u) => {
                return Err(ConfigError::Invalid {
                    field: "docs_base_url".into(),
                    reason: format!("unsupported scheme: {}", u.scheme()),
                });
            }
            Err(e) => {
                return Err(ConfigError::Invalid { field: "docs_base_url".into(), reason: e.to_string() });
            }
        }

        if self.crawl_concurrency == 0 || self.crawl_concurrency > 64 {
            return Err(ConfigError::Invalid {
                field: "crawl_concurrency".into(),
                reason: "must be between 1 and 64".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.ttl_days == 0 {
            tracing::warn!("ttl_days is 0; every request after a sync will schedule a refresh");
        }

        Ok(())
    }
}

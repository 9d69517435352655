//! Range checks applied to `AppConfig` once every layer has been merged.

use std::ops::RangeInclusive;

use crate::config::AppConfig;
use thiserror::Error;

/// Accepted connect/handshake/read timeout, in milliseconds.
const TIMEOUT_MS_BOUNDS: RangeInclusive<u64> = 100..=300_000;

/// Accepted response size cap, in bytes (1 byte to 100 MiB).
const MAX_BYTES_BOUNDS: RangeInclusive<usize> = 1..=100 * 1024 * 1024;

/// Upper bound on redirect hops.
const MAX_REDIRECT_LIMIT: u32 = 20;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider failed to read or decode.
    #[error("configuration could not be loaded: {0}")]
    LoadFailed(String),

    /// A merged value is outside its accepted range.
    #[error("configuration field `{field}` rejected: {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.to_string(), reason: reason.into() }
}

impl AppConfig {
    /// Check merged values before they reach the client.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "a User-Agent is required"));
        }

        if !TIMEOUT_MS_BOUNDS.contains(&self.timeout_ms) {
            return Err(invalid(
                "timeout_ms",
                format!("{} is outside {}..={}", self.timeout_ms, TIMEOUT_MS_BOUNDS.start(), TIMEOUT_MS_BOUNDS.end()),
            ));
        }

        if !MAX_BYTES_BOUNDS.contains(&self.max_bytes) {
            return Err(invalid(
                "max_bytes",
                format!("{} is outside {}..={}", self.max_bytes, MAX_BYTES_BOUNDS.start(), MAX_BYTES_BOUNDS.end()),
            ));
        }

        if self.max_redirects > MAX_REDIRECT_LIMIT {
            return Err(invalid("max_redirects", format!("at most {MAX_REDIRECT_LIMIT} hops are allowed")));
        }

        let scheme_ok = self.search_url.starts_with("http://") || self.search_url.starts_with("https://");
        if !scheme_ok {
            return Err(invalid("search_url", "search engine URL must be http or https"));
        }

        if self.cache_path.as_os_str().is_empty() {
            return Err(invalid("cache_path", "a cache file path is required"));
        }

        if self.accept_invalid_certs {
            tracing::debug!("TLS certificate verification is disabled");
        }

        Ok(())
    }
}

//! Layered settings for the fetch client and CLI.
//!
//! Values are merged with figment, later layers overriding earlier ones:
//! compiled-in defaults, then an optional TOML file named by
//! `TEXTWEB_CONFIG_FILE`, then `TEXTWEB_*` environment variables. Any field
//! missing from every layer keeps its default.

use std::path::PathBuf;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Browser-like User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:123.0) Gecko/20100101 Firefox/123.0";

/// Query endpoint the search term is appended to.
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search?q=";

/// Environment variable naming an optional TOML settings file.
pub const CONFIG_FILE_ENV: &str = "TEXTWEB_CONFIG_FILE";

const ENV_PREFIX: &str = "TEXTWEB_";

/// Client settings. Each field maps to `TEXTWEB_<FIELD>` in the environment
/// and to a top-level key of the same name in the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON file holding cached responses.
    pub cache_path: PathBuf,
    pub user_agent: String,
    /// Redirect hops followed before the 3xx itself is returned.
    pub max_redirects: u32,
    /// Applied separately to connect, TLS handshake, and reading the response.
    pub timeout_ms: u64,
    /// Responses longer than this fail with `TOO_LARGE`.
    pub max_bytes: usize,
    /// Complete TLS handshakes without checking the server certificate.
    pub accept_invalid_certs: bool,
    pub search_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(crate::cache::DEFAULT_CACHE_FILE),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 5,
            timeout_ms: 30_000,
            max_bytes: 10 * 1024 * 1024,
            accept_invalid_certs: true,
            search_url: DEFAULT_SEARCH_URL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Providers in merge order, without extracting.
    fn figment() -> Figment {
        let layered = Figment::from(Serialized::defaults(Self::default()));

        let layered = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => layered.merge(Toml::file(path)),
            Err(_) => layered,
        };

        layered.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Merge every layer and validate the result.
    ///
    /// # Errors
    ///
    /// `ConfigError::LoadFailed` when the TOML file or an environment value
    /// does not decode; `ConfigError::Invalid` when a merged value is out of
    /// range.
    pub fn load() -> Result<Self, ConfigError> {
        let merged: Self = Self::figment()
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        merged.validate()?;
        tracing::debug!(cache_path = %merged.cache_path.display(), "configuration loaded");

        Ok(merged)
    }
}

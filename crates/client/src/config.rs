//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `EATHUB_API_URL` - Base URL of the EatHub REST API (default: `http://localhost:5000/api`)
//! - `EATHUB_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `EATHUB_CACHE_TTL_SECS` - Default cache freshness window (default: 300)
//! - `EATHUB_RETRY_INITIAL_DELAY_MS` - First retry backoff (default: 1000)
//! - `EATHUB_RETRY_MAX_DELAY_MS` - Backoff ceiling (default: 10000)

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid API URL {0}: {1}")]
    InvalidUrl(String, String),
}

/// Backoff bounds shared by every retrying call site.
///
/// The number of retries is fixed per endpoint; only the delays are
/// configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

/// EatHub client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, always ending in `/`.
    pub base_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// TTL used by cache writes that don't name their own.
    pub cache_ttl: Duration,
    /// Retry backoff bounds.
    pub retry: RetrySettings,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if `base_url` is not an absolute
    /// `http(s)` URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            retry: RetrySettings::default(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let mut config = Self::new(&get_env_or_default("EATHUB_API_URL", DEFAULT_API_URL))?;
        config.request_timeout = Duration::from_secs(parse_env_or(
            "EATHUB_REQUEST_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        config.cache_ttl =
            Duration::from_secs(parse_env_or("EATHUB_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?);
        config.retry = RetrySettings {
            initial_delay: Duration::from_millis(parse_env_or(
                "EATHUB_RETRY_INITIAL_DELAY_MS",
                DEFAULT_INITIAL_DELAY_MS,
            )?),
            max_delay: Duration::from_millis(parse_env_or(
                "EATHUB_RETRY_MAX_DELAY_MS",
                DEFAULT_MAX_DELAY_MS,
            )?),
        };
        if config.retry.max_delay < config.retry.initial_delay {
            return Err(ConfigError::InvalidEnvVar(
                "EATHUB_RETRY_MAX_DELAY_MS".to_string(),
                "must not be smaller than EATHUB_RETRY_INITIAL_DELAY_MS".to_string(),
            ));
        }
        Ok(config)
    }

    /// Replace the retry backoff bounds.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    // Url::join drops the last path segment unless the base ends with '/'
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| ConfigError::InvalidUrl(raw.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(
            raw.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Get an optional environment variable.
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
#[must_use]
pub fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

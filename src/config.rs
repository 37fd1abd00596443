//! Client configuration parsed from environment variables.
//!
//! Every knob has a typed default; unparseable numbers fall back to the
//! default rather than failing. Only an unusable base URL is an error.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const MIN_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_NOTICE_TTL_MS: u64 = 4000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL (expected http:// or https://): {0}")]
    InvalidBaseUrl(String),
}

/// Timeouts applied to every backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Duration,
    pub connect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub poll_interval: Duration,
    pub timeouts: Timeouts,
    pub notice_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            token: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeouts: Timeouts::default(),
            notice_ttl: Duration::from_millis(DEFAULT_NOTICE_TTL_MS),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `BOOKSWAP_API_URL`: default `http://127.0.0.1:8000/api`
    /// - `BOOKSWAP_API_TOKEN`: bearer token sent on every request
    /// - `CHAT_POLL_INTERVAL_MS`: default 5000, floored at 100
    /// - `CHAT_REQUEST_TIMEOUT_SECS`: default 10
    /// - `CHAT_CONNECT_TIMEOUT_SECS`: default 5
    /// - `NOTICE_TTL_MS`: default 4000
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when the URL scheme is not HTTP(S).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when the URL scheme is not HTTP(S).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = normalize_base_url(&lookup("BOOKSWAP_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned()))?;
        let token = lookup("BOOKSWAP_API_TOKEN").filter(|t| !t.trim().is_empty());
        let poll_ms = parse_or(&lookup, "CHAT_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS);
        let timeouts = Timeouts {
            request: Duration::from_secs(parse_or(&lookup, "CHAT_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)),
            connect: Duration::from_secs(parse_or(&lookup, "CHAT_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)),
        };

        Ok(Self {
            base_url,
            token,
            poll_interval: clamp_poll_interval(Duration::from_millis(poll_ms)),
            timeouts,
            notice_ttl: Duration::from_millis(parse_or(&lookup, "NOTICE_TTL_MS", DEFAULT_NOTICE_TTL_MS)),
        })
    }
}

/// Trim trailing slashes and require an HTTP(S) scheme.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] for any other scheme.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(trimmed.to_owned());
    }
    Err(ConfigError::InvalidBaseUrl(raw.to_owned()))
}

/// Poll intervals below [`MIN_POLL_INTERVAL_MS`] would turn the loop into a busy-wait.
#[must_use]
pub fn clamp_poll_interval(interval: Duration) -> Duration {
    interval.max(Duration::from_millis(MIN_POLL_INTERVAL_MS))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:4000";
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Errors produced while building a [`ClientConfig`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The origin is not an absolute `http(s)` URL.
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),

    /// A numeric setting could not be parsed.
    #[error("config parse failed: {key}={value}")]
    Parse { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme + host (+ port) of the backend, without a trailing slash.
    /// Empty in the browser, where requests are origin-relative.
    pub origin: String,
    /// Fixed path prefix every request path is appended to (e.g. `/api`).
    pub api_prefix: String,
    /// Optional whole-request timeout for the native transport.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_owned(),
            api_prefix: DEFAULT_API_PREFIX.to_owned(),
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Config for a given origin with default prefix and no timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `origin` is not an absolute `http(s)` URL.
    pub fn new(origin: &str) -> Result<Self, ConfigError> {
        Ok(Self { origin: normalize_origin(origin)?, ..Self::default() })
    }

    /// Config for same-origin browser requests (`/api/...`).
    #[must_use]
    pub fn same_origin() -> Self {
        Self { origin: String::new(), ..Self::default() }
    }

    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `MYNUTE_ADMIN_ORIGIN`: default `http://127.0.0.1:4000`
    /// - `MYNUTE_ADMIN_API_PREFIX`: default `/api`
    /// - `MYNUTE_ADMIN_TIMEOUT_SECS`: unset means no timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the origin or the timeout cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var("MYNUTE_ADMIN_ORIGIN").ok().as_deref(),
            std::env::var("MYNUTE_ADMIN_API_PREFIX").ok().as_deref(),
            std::env::var("MYNUTE_ADMIN_TIMEOUT_SECS").ok().as_deref(),
        )
    }

    fn from_vars(origin: Option<&str>, prefix: Option<&str>, timeout: Option<&str>) -> Result<Self, ConfigError> {
        let origin = normalize_origin(origin.unwrap_or(DEFAULT_ORIGIN))?;
        let api_prefix = normalize_prefix(prefix.unwrap_or(DEFAULT_API_PREFIX));
        let request_timeout_secs = match timeout.map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|_| ConfigError::Parse { key: "MYNUTE_ADMIN_TIMEOUT_SECS", value: raw.to_owned() })?,
            ),
        };
        Ok(Self { origin, api_prefix, request_timeout_secs })
    }

    /// Full URL for a request path relative to the API prefix.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}{}/{path}", self.origin, self.api_prefix)
    }
}

fn normalize_origin(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(trimmed.to_owned());
    }
    Err(ConfigError::InvalidOrigin(raw.to_owned()))
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("/{trimmed}")
}

//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::RequestError;
use crate::http::DEFAULT_TIMEOUT;
use crate::placeholder::JSONPLACEHOLDER_URL;

pub const BASE_URL_ENV: &str = "FETCH_BASE_URL";
pub const TIMEOUT_ENV: &str = "FETCH_TIMEOUT_MS";

/// Base address and default timeout of an `ApiClient`.
///
/// A client owns its config for its whole lifetime; build a new client to
/// change either value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    default_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Read `FETCH_BASE_URL` (defaults to the public JSONPlaceholder API) and
    /// `FETCH_TIMEOUT_MS` (defaults to 5000).
    pub fn from_env() -> Result<Self, RequestError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RequestError> {
        let base_url = lookup(BASE_URL_ENV).unwrap_or_else(|| JSONPLACEHOLDER_URL.to_string());
        Url::parse(&base_url)
            .map_err(|e| RequestError::InvalidRequest(format!("{BASE_URL_ENV}={base_url}: {e}")))?;

        let timeout = match lookup(TIMEOUT_ENV) {
            None => DEFAULT_TIMEOUT,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(RequestError::InvalidRequest(format!(
                        "{TIMEOUT_ENV} must be a positive integer, got {raw:?}"
                    )))
                }
            },
        };

        Ok(Self::new(base_url).with_default_timeout(timeout))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

//! Client configuration.
//!
//! `ClientConfig` carries the engine's REST root URL plus the transport
//! settings handed to the HTTP client. Values can be set explicitly or read
//! from the environment.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default REST root of a locally running engine.
pub const DEFAULT_URL: &str = "http://localhost:8080/engine-rest";

pub const ENV_URL: &str = "CAMUNDA_URL";
pub const ENV_TIMEOUT_SECS: &str = "CAMUNDA_TIMEOUT_SECS";
pub const ENV_AUTHORIZATION: &str = "CAMUNDA_AUTHORIZATION";

/// Connection settings for the engine REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST root, e.g. `http://localhost:8080/engine-rest`, without trailing `/`.
    pub base_url: String,
    /// Upper bound on a whole request, enforced by the HTTP client.
    pub timeout: Option<Duration>,
    /// Value sent verbatim in the `Authorization` header.
    pub authorization: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
            authorization: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Read the configuration from `CAMUNDA_URL`, `CAMUNDA_TIMEOUT_SECS` and
    /// `CAMUNDA_AUTHORIZATION`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup(ENV_URL).unwrap_or_else(|| DEFAULT_URL.to_string());
        let mut config = Self::new(&url);

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::Configuration(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {raw:?}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        config.authorization = lookup(ENV_AUTHORIZATION);

        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

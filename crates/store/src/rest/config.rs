//! REST store connection settings

use coupup_core::{Error, Result};
use std::time::Duration;

/// Environment variable holding the store base URL
pub const ENV_STORE_URL: &str = "COUPUP_STORE_URL";
/// Environment variable holding the optional bearer token
pub const ENV_STORE_TOKEN: &str = "COUPUP_STORE_TOKEN";

/// Connection settings for the REST document store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    /// How often subscription watchers poll for changes
    pub poll_interval: Duration,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            poll_interval: Duration::from_secs(2),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build from `COUPUP_STORE_URL` / `COUPUP_STORE_TOKEN`
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_STORE_URL)
            .map_err(|_| Error::InvalidData(format!("{} is not set", ENV_STORE_URL)))?;
        let mut config = Self::new(base_url);
        if let Ok(token) = std::env::var(ENV_STORE_TOKEN) {
            if !token.is_empty() {
                config = config.with_auth_token(token);
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = StoreConfig::new("https://store.example.com/");
        assert_eq!(config.base_url, "https://store.example.com");
    }
}

use crate::error::{Result, StoreError};
use std::env;
use std::time::Duration;

pub const OWNER_ENV: &str = "OWNER";
pub const AUTH_TOKEN_ENV: &str = "AUTH_TOKEN";
pub const API_URL_ENV: &str = "GITHUB_API_URL";

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const API_VERSION: &str = "2022-11-28";

/// Connection settings for the hosted content store.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub api_url: String,
    /// Organization that owns every phenotype repository.
    pub owner: String,
    pub token: String,
    pub user_agent: String,
    /// Upper bound for a single remote call.
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn new(owner: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            owner: owner.into(),
            token: token.into(),
            user_agent: format!("phenoflow-server/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self> {
        let owner = required_env(OWNER_ENV)?;
        let token = required_env(AUTH_TOKEN_ENV)?;
        let mut config = Self::new(owner, token);
        if let Ok(url) = env::var(API_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                config.api_url = url.trim_end_matches('/').to_string();
            }
        }
        Ok(config)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn required_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(StoreError::InvalidConfig(format!("{name} must be set"))),
    }
}

use std::{env, time::Duration};

use tracing::{info, warn};

use crate::auth::Credentials;
use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://gateway.marvel.com/v1/public";
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Largest `limit` the catalog accepts.
pub const MAX_PAGE_SIZE: u64 = 100;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Where the catalog lives and how to sign for it.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub credentials: Credentials,
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes `env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("MARVEL_URL").unwrap_or_else(|| {
            info!("MARVEL_URL not set, using default: {DEFAULT_BASE_URL}");
            DEFAULT_BASE_URL.to_string()
        });
        let public_key = required(&lookup, "MARVEL_PUBLIC_KEY")?;
        let private_key = required(&lookup, "MARVEL_PRIVATE_KEY")?;

        Ok(Self {
            base_url,
            credentials: Credentials::new(public_key, private_key),
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    match lookup(key).map(|v| v.trim().to_string()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => {
            warn!("Environment variable {key} not found");
            Err(ConfigError::Missing(key))
        }
    }
}

/// Behaviour of the list controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListConfig {
    pub page_size: u64,
    pub debounce: Duration,
    /// Jump back to page 1 when the search term changes. Off by default,
    /// which keeps the current page and lets the clamp correct it.
    pub reset_page_on_search: bool,
}

impl ListConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::InvalidPageSize(self.page_size));
        }
        Ok(self)
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
            reset_page_on_search: false,
        }
    }
}

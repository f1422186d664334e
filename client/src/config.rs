use std::{num::NonZeroUsize, time::Duration};

use shared::{BoundingRegion, Units};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_ROUTING_URL: &str = "http://localhost:5001";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be an http(s) URL, got `{value}`")]
    InvalidUrl { key: &'static str, value: String },
    #[error("{key} must be a positive integer, got `{value}`")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key}: {reason}")]
    InvalidUnits { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub routing_url: String,
    pub geocoder_url: String,
    pub units: Units,
    pub request_timeout: Duration,
    pub debounce: Duration,
    pub search_limit: usize,
    pub search_cache_capacity: NonZeroUsize,
    pub history_page_size: usize,
    pub user_agent: String,
    pub region: BoundingRegion,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            routing_url: DEFAULT_ROUTING_URL.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            units: Units::Miles,
            request_timeout: Duration::from_secs(10),
            debounce: Duration::from_millis(300),
            search_limit: 8,
            search_cache_capacity: NonZeroUsize::new(32).unwrap_or(NonZeroUsize::MIN),
            history_page_size: 20,
            user_agent: concat!("circuity-client/", env!("CARGO_PKG_VERSION")).to_string(),
            region: BoundingRegion::california(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup, falling back to defaults for missing keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("CIRCUITY_API_URL") {
            config.api_url = parse_url("CIRCUITY_API_URL", value)?;
        }
        if let Some(value) = lookup("CIRCUITY_ROUTING_URL") {
            config.routing_url = parse_url("CIRCUITY_ROUTING_URL", value)?;
        }
        if let Some(value) = lookup("CIRCUITY_GEOCODER_URL") {
            config.geocoder_url = parse_url("CIRCUITY_GEOCODER_URL", value)?;
        }
        if let Some(value) = lookup("CIRCUITY_UNITS") {
            config.units = value.parse().map_err(|reason| ConfigError::InvalidUnits {
                key: "CIRCUITY_UNITS",
                reason,
            })?;
        }
        if let Some(value) = lookup("CIRCUITY_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_positive("CIRCUITY_TIMEOUT_SECS", value)? as u64);
        }
        if let Some(value) = lookup("CIRCUITY_DEBOUNCE_MS") {
            config.debounce =
                Duration::from_millis(parse_positive("CIRCUITY_DEBOUNCE_MS", value)? as u64);
        }
        if let Some(value) = lookup("CIRCUITY_HISTORY_PAGE_SIZE") {
            config.history_page_size = parse_positive("CIRCUITY_HISTORY_PAGE_SIZE", value)?;
        }

        tracing::debug!(
            api = %config.api_url,
            routing = %config.routing_url,
            geocoder = %config.geocoder_url,
            units = %config.units,
            "client configuration loaded"
        );
        Ok(config)
    }
}

fn parse_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidUrl { key, value })
    }
}

fn parse_positive(key: &'static str, value: String) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber { key, value }),
    }
}

//! Sales service configuration.
//!
//! Loaded from environment variables with fallback to defaults.

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use salesdesk_sales::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use salesdesk_sales::specification::DEFAULT_CANCELLATION_WINDOW_DAYS;

pub const CANCELLATION_WINDOW_DAYS_VAR: &str = "SALES_CANCELLATION_WINDOW_DAYS";
pub const DEFAULT_PAGE_SIZE_VAR: &str = "SALES_DEFAULT_PAGE_SIZE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesConfig {
    /// Sales dated more than this many days ago can no longer be cancelled.
    pub cancellation_window_days: u32,

    /// Page size used when a listing request does not name one.
    pub default_page_size: u32,
}

impl Default for SalesConfig {
    fn default() -> Self {
        Self {
            cancellation_window_days: DEFAULT_CANCELLATION_WINDOW_DAYS,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SalesConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cancellation_window_days = match lookup(CANCELLATION_WINDOW_DAYS_VAR) {
            Some(raw) => parse(CANCELLATION_WINDOW_DAYS_VAR, &raw)?,
            None => defaults.cancellation_window_days,
        };

        let default_page_size = match lookup(DEFAULT_PAGE_SIZE_VAR) {
            Some(raw) => parse(DEFAULT_PAGE_SIZE_VAR, &raw)?,
            None => defaults.default_page_size,
        };
        if !(1..=MAX_PAGE_SIZE).contains(&default_page_size) {
            return Err(ConfigError::InvalidValue(DEFAULT_PAGE_SIZE_VAR.to_string()));
        }

        Ok(Self {
            cancellation_window_days,
            default_page_size,
        })
    }
}

fn parse(name: &str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<SalesConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SalesConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(load(&[]).unwrap(), SalesConfig::default());
        assert_eq!(SalesConfig::default().cancellation_window_days, 30);
        assert_eq!(SalesConfig::default().default_page_size, 10);
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = load(&[
            (CANCELLATION_WINDOW_DAYS_VAR, "0"),
            (DEFAULT_PAGE_SIZE_VAR, " 100 "),
        ])
        .unwrap();
        assert_eq!(config.cancellation_window_days, 0);
        assert_eq!(config.default_page_size, 100);
    }

    #[test]
    fn negative_window_is_rejected() {
        assert_eq!(
            load(&[(CANCELLATION_WINDOW_DAYS_VAR, "-1")]),
            Err(ConfigError::InvalidValue(CANCELLATION_WINDOW_DAYS_VAR.to_string()))
        );
    }

    #[test]
    fn page_size_outside_bounds_is_rejected() {
        for raw in ["0", "101", "ten"] {
            assert_eq!(
                load(&[(DEFAULT_PAGE_SIZE_VAR, raw)]),
                Err(ConfigError::InvalidValue(DEFAULT_PAGE_SIZE_VAR.to_string()))
            );
        }
    }
}

use std::time::Duration;

use crate::error::{ListingError, Result};

pub const DEFAULT_MAX_UPDATE_ATTEMPTS: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for [`ListingService`](crate::ListingService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Total read-reconcile-commit attempts before a conflict is surfaced.
    pub max_update_attempts: u32,
    /// Upper bound on a whole update, retries included.
    pub request_timeout: Duration,
    /// Receives the updated listing after every successful commit.
    pub webhook_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: DEFAULT_MAX_UPDATE_ATTEMPTS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            webhook_url: None,
        }
    }
}

impl ServiceConfig {
    /// Read settings from the process environment, falling back to defaults.
    ///
    /// - `LISTING_MAX_UPDATE_ATTEMPTS`
    /// - `LISTING_REQUEST_TIMEOUT_SECS`
    /// - `LISTING_WEBHOOK_URL`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let max_update_attempts = match lookup("LISTING_MAX_UPDATE_ATTEMPTS") {
            Some(raw) => parse_number(&raw, "LISTING_MAX_UPDATE_ATTEMPTS")?,
            None => defaults.max_update_attempts,
        };
        if max_update_attempts == 0 {
            return Err(ListingError::Config(
                "LISTING_MAX_UPDATE_ATTEMPTS must be at least 1".to_owned(),
            ));
        }

        let request_timeout = match lookup("LISTING_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number(&raw, "LISTING_REQUEST_TIMEOUT_SECS")?),
            None => defaults.request_timeout,
        };
        if request_timeout.is_zero() {
            return Err(ListingError::Config(
                "LISTING_REQUEST_TIMEOUT_SECS must be at least 1".to_owned(),
            ));
        }

        let webhook_url = lookup("LISTING_WEBHOOK_URL").filter(|url| !url.trim().is_empty());

        Ok(Self {
            max_update_attempts,
            request_timeout,
            webhook_url,
        })
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ListingError::Config(format!("{key} must be a number, got `{raw}`")))
}

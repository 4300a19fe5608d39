//! Client configuration.
//!
//! `ClientConfig` tells a front end where the catalog service lives and how
//! long to wait for it. Values come from a JSON file (see the CLI profiles),
//! then environment overrides, then validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credential::DEFAULT_TOKEN_KEY;
use crate::error::{Error, Result};
use crate::util::{compact_text, is_http_url, normalize_text_option};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

pub const API_BASE_URL_ENV: &str = "KATALOG_API_BASE_URL";
pub const REQUEST_TIMEOUT_ENV: &str = "KATALOG_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub token_cookie_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_cookie_name: DEFAULT_TOKEN_KEY.to_string(),
        }
    }
}

impl ClientConfig {
    /// Apply `KATALOG_*` overrides read through `lookup`.
    ///
    /// `lookup` is usually `|name| std::env::var(name).ok()`.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = normalize_text_option(lookup(API_BASE_URL_ENV)) {
            self.api_base_url = url;
        }
        if let Some(timeout) = normalize_text_option(lookup(REQUEST_TIMEOUT_ENV)) {
            match timeout.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => tracing::warn!(
                    "Ignoring {REQUEST_TIMEOUT_ENV}={}: not a number of seconds",
                    compact_text(&timeout)
                ),
            }
        }
        self
    }

    /// Normalize fields and reject values the gateway cannot use.
    pub fn validated(self) -> Result<Self> {
        let api_base_url = normalize_text_option(Some(self.api_base_url))
            .ok_or_else(|| Error::Config("api_base_url is required".to_string()))?;
        if !is_http_url(&api_base_url) {
            return Err(Error::Config(
                "api_base_url must include http:// or https://".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(Error::Config(format!(
                "request_timeout_secs must be between 1 and {MAX_REQUEST_TIMEOUT_SECS}"
            )));
        }
        let token_cookie_name = normalize_text_option(Some(self.token_cookie_name))
            .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string());

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            request_timeout_secs: self.request_timeout_secs,
            token_cookie_name,
        })
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parse a config document from raw JSON and validate it.
pub fn parse_client_config(payload: &str) -> Result<ClientConfig> {
    let config: ClientConfig = serde_json::from_str(payload)
        .map_err(|error| Error::Config(format!("invalid client config JSON: {error}")))?;
    config.validated()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_service() {
        let config = ClientConfig::default().validated().unwrap();
        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.token_cookie_name, "token");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn validated_strips_trailing_slash() {
        let config = ClientConfig {
            api_base_url: " https://katalog.example.com/api/ ".to_string(),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(config.api_base_url, "https://katalog.example.com/api");
    }

    #[test]
    fn validated_rejects_missing_scheme_and_zero_timeout() {
        let no_scheme = ClientConfig {
            api_base_url: "katalog.example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(no_scheme.validated(), Err(Error::Config(_))));

        let zero_timeout = ClientConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(zero_timeout.validated(), Err(Error::Config(_))));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let config = ClientConfig::default().with_overrides(|name| match name {
            API_BASE_URL_ENV => Some("https://override.example.com".to_string()),
            REQUEST_TIMEOUT_ENV => Some("not-a-number".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://override.example.com");
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        let error = parse_client_config(r#"{"api_base_url":"http://x","retries":3}"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn parse_fills_missing_fields_with_defaults() {
        let config = parse_client_config(r#"{"api_base_url":"http://10.0.0.2:3000"}"#).unwrap();
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.token_cookie_name, "token");
    }
}

//! Transport configuration
//!
//! An explicit configuration struct passed into the transport constructor.
//! Nothing here reads the process environment at module load; `from_env`
//! exists as a convenience the application calls once at startup.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Environment variable holding the backend base URL
pub const ENV_BASE_URL: &str = "RADAR_API_URL";
/// Environment variable holding the backend API key
pub const ENV_API_KEY: &str = "RADAR_API_KEY";
/// Environment variable holding an optional user bearer token
pub const ENV_BEARER_TOKEN: &str = "RADAR_BEARER_TOKEN";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The base URL could not be parsed
    #[error("Invalid base URL: {reason}")]
    InvalidUrl { reason: String },

    /// A required environment variable is not set
    #[error("Missing environment variable: {name}")]
    MissingVar { name: &'static str },
}

/// Connection settings for the PostgREST endpoint
///
/// The bearer token, when present, is an authenticated user session token
/// issued by the backend's auth service; this crate only passes it through
/// and never refreshes or stores credentials itself.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Base URL of the backend (the `/rest/v1/` prefix is appended per call)
    pub base_url: Url,
    /// Project API key, sent as the `apikey` header
    pub api_key: String,
    /// Optional user session token; falls back to the API key when absent
    pub bearer_token: Option<String>,
    /// Full-request timeout
    pub timeout: Duration,
}

impl PostgrestConfig {
    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Build a configuration from a base URL and API key
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if the base URL does not parse.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl {
            reason: e.to_string(),
        })?;
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            bearer_token: None,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Attach a user session token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the configuration from the process environment
    ///
    /// Intended to be called explicitly at application startup, never at
    /// module load. `RADAR_BEARER_TOKEN` is optional.
    ///
    /// # Errors
    ///
    /// Returns `MissingVar` when `RADAR_API_URL` or `RADAR_API_KEY` is
    /// unset, or `InvalidUrl` when the URL does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine; the variables may be set directly.
        dotenvy::dotenv().ok();
        let base_url = std::env::var(ENV_BASE_URL).map_err(|_| ConfigError::MissingVar {
            name: ENV_BASE_URL,
        })?;
        let api_key = std::env::var(ENV_API_KEY).map_err(|_| ConfigError::MissingVar {
            name: ENV_API_KEY,
        })?;
        let mut config = Self::new(&base_url, api_key)?;
        if let Ok(token) = std::env::var(ENV_BEARER_TOKEN) {
            config = config.with_bearer_token(token);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_with_valid_url() {
        let config = PostgrestConfig::new("https://example.supabase.co", "anon-key").unwrap();
        assert_eq!(config.base_url.as_str(), "https://example.supabase.co/");
        assert_eq!(config.api_key, "anon-key");
        assert!(config.bearer_token.is_none());
        assert_eq!(config.timeout, PostgrestConfig::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_new_with_invalid_url() {
        let result = PostgrestConfig::new("not a url", "key");
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_builder_methods() {
        let config = PostgrestConfig::new("https://example.supabase.co", "key")
            .unwrap()
            .with_bearer_token("user-jwt")
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.bearer_token.as_deref(), Some("user-jwt"));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }
}

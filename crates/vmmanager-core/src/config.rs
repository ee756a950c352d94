//! Session configuration.
//!
//! A [`SessionConfig`] is supplied once when a session is opened and never
//! changes afterwards. It carries the platform base URL, TLS settings and the
//! options forwarded to the HTTP client (default headers, timeouts, proxy).

use crate::error::{Error, Result};
use crate::types::AUTH_TOKEN_HEADER;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Configuration for a VMmanager session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    /// Platform base URL, e.g. `https://vm6.example.com`
    #[validate(url)]
    pub base_url: String,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a custom CA certificate (PEM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Headers sent with every request
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Session token sent in the `x-xsrf-token` header
    #[serde(skip)]
    pub auth_token: Option<SecretString>,

    /// User agent override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Proxy URL for all requests
    #[validate(url)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

impl SessionConfig {
    /// Create a configuration for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let config = Self {
            base_url: base_url.into(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            headers: BTreeMap::new(),
            auth_token: None,
            user_agent: None,
            proxy: None,
        };

        config.check()?;
        Ok(config)
    }

    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|err| Error::ConfigError(format!("Invalid session configuration: {err}")))?;
        config.check()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| {
            Error::ConfigError(format!("Failed to read {}: {err}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set a custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.tls_ca_cert = Some(path.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout_secs = seconds;
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Authenticate every request with a session token.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(SecretString::new(token.into().into_boxed_str()));
        self
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Route requests through a proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// The request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Name of the header carrying the session token.
    #[must_use]
    pub const fn auth_header(&self) -> &'static str {
        AUTH_TOKEN_HEADER
    }

    /// Validate all fields.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        Ok(())
    }

    /// Parse the base URL, dropping any query or fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or cannot carry a path.
    pub fn parse_base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::ConfigError(format!("Invalid base URL: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(Error::ConfigError(format!(
                "Base URL cannot carry a path: {}",
                self.base_url
            )));
        }
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_new_defaults() {
        let config = SessionConfig::new("https://vm6.example.com").unwrap();
        assert!(config.tls_verify);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(config.headers.is_empty());
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let err = SessionConfig::new("not a url").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new("https://vm6.example.com")
            .unwrap()
            .with_tls_verify(false)
            .with_timeout(120)
            .with_connect_timeout(3)
            .with_header("Accept-Language", "en")
            .with_auth_token("abc123")
            .with_user_agent("deploy-bot/1.0")
            .with_proxy("http://proxy.internal:3128");

        assert!(!config.tls_verify);
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.headers.get("Accept-Language").map(String::as_str), Some("en"));
        assert_eq!(
            config.auth_token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("abc123".to_string())
        );
        assert_eq!(config.user_agent.as_deref(), Some("deploy-bot/1.0"));
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let config = SessionConfig::new("https://vm6.example.com")
            .unwrap()
            .with_timeout(0);
        assert!(config.check().is_err());
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let config = SessionConfig::from_json(
            r#"{"base_url": "https://vm6.example.com", "tls_verify": false, "headers": {"X-Trace": "1"}}"#,
        )
        .unwrap();
        assert!(!config.tls_verify);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.headers.len(), 1);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(SessionConfig::from_json("{}").is_err());
        assert!(SessionConfig::from_json(r#"{"base_url": "nope"}"#).is_err());
    }

    #[test]
    fn test_auth_token_not_serialized() {
        let config = SessionConfig::new("https://vm6.example.com")
            .unwrap()
            .with_auth_token("secret-token");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-token"));
        assert!(!json.contains("auth_token"));
    }

    #[test]
    fn test_parse_base_url_strips_query() {
        let config = SessionConfig::new("https://vm6.example.com/panel/?x=1#frag").unwrap();
        let url = config.parse_base_url().unwrap();
        assert_eq!(url.as_str(), "https://vm6.example.com/panel/");
    }
}

//! API areas exposed by a VMmanager 6 installation.
//!
//! Each area lives under its own path prefix, `/{definition}/{version}`,
//! below the platform base URL.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Header carrying the session token issued by the auth area.
pub const AUTH_TOKEN_HEADER: &str = "x-xsrf-token";

/// Supported API definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiDefinition {
    /// Authorization and authentication
    Auth,
    /// Virtual machines, clusters and the task manager
    Vm,
    /// IP address management
    Ip,
    /// DNS proxy service
    DnsProxy,
}

impl ApiDefinition {
    /// Returns the path segment identifying this definition.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Vm => "vm",
            Self::Ip => "ip",
            Self::DnsProxy => "dnsproxy",
        }
    }

    /// Returns the API version targeted by default.
    #[must_use]
    pub const fn default_version(&self) -> &'static str {
        match self {
            Self::Auth => "v4",
            Self::Vm | Self::Ip | Self::DnsProxy => "v3",
        }
    }

    /// Returns all known definitions.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Auth, Self::Vm, Self::Ip, Self::DnsProxy]
    }
}

impl FromStr for ApiDefinition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auth" => Ok(Self::Auth),
            "vm" => Ok(Self::Vm),
            "ip" => Ok(Self::Ip),
            "dnsproxy" => Ok(Self::DnsProxy),
            _ => Err(Error::ConfigError(format!("Unknown API definition: {s}"))),
        }
    }
}

impl fmt::Display for ApiDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A definition/version pair that renders the fixed path prefix of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiArea {
    definition: String,
    version: String,
}

impl ApiArea {
    /// Create an area from arbitrary definition and version segments.
    #[must_use]
    pub fn new(definition: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            version: version.into(),
        }
    }

    /// The area for a known definition at its default version.
    #[must_use]
    pub fn for_definition(definition: ApiDefinition) -> Self {
        Self::new(definition.name(), definition.default_version())
    }

    /// Replace the version segment.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The definition segment.
    #[must_use]
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// The version segment.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The path prefix, e.g. `/auth/v4`.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("/{}/{}", self.definition, self.version)
    }
}

impl From<ApiDefinition> for ApiArea {
    fn from(definition: ApiDefinition) -> Self {
        Self::for_definition(definition)
    }
}

impl fmt::Display for ApiArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.definition, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_names() {
        assert_eq!(ApiDefinition::Auth.name(), "auth");
        assert_eq!(ApiDefinition::Vm.name(), "vm");
        assert_eq!(ApiDefinition::Ip.name(), "ip");
        assert_eq!(ApiDefinition::DnsProxy.name(), "dnsproxy");
        assert_eq!(ApiDefinition::all().len(), 4);
    }

    #[test]
    fn test_default_prefixes() {
        assert_eq!(ApiArea::from(ApiDefinition::Auth).prefix(), "/auth/v4");
        assert_eq!(ApiArea::from(ApiDefinition::Vm).prefix(), "/vm/v3");
        assert_eq!(ApiArea::from(ApiDefinition::Ip).prefix(), "/ip/v3");
        assert_eq!(ApiArea::from(ApiDefinition::DnsProxy).prefix(), "/dnsproxy/v3");
    }

    #[test]
    fn test_version_override() {
        let area = ApiArea::for_definition(ApiDefinition::Vm).with_version("v4");
        assert_eq!(area.prefix(), "/vm/v4");
        assert_eq!(area.to_string(), "vm/v4");
    }

    #[test]
    fn test_definition_from_str() {
        assert_eq!("DNSPROXY".parse::<ApiDefinition>().unwrap(), ApiDefinition::DnsProxy);
        assert!(matches!(
            "billing".parse::<ApiDefinition>(),
            Err(Error::ConfigError(_))
        ));
    }
}

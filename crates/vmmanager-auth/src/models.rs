//! Data models for the auth API.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use vmmanager_core::SessionConfig;

/// Email/password pair used to obtain a session token.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: SecretString,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::new(password.into().into_boxed_str()),
        }
    }

    /// The account email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The request body expected by `POST /public/token`.
    #[must_use]
    pub fn to_body(&self) -> Value {
        json!({
            "email": self.email,
            "password": self.password.expose_secret(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Session token issued by `POST /public/token`.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthToken {
    /// Token value
    pub token: String,

    /// Token id, when returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Any other fields returned by the server
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthToken {
    /// Attach this token to a session configuration.
    #[must_use]
    pub fn authorize(&self, config: SessionConfig) -> SessionConfig {
        config.with_auth_token(self.token.clone())
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"[REDACTED]")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

//! IPmanager API session for VMmanager 6.
//!
//! [`IpSession`] exposes the generic `get`/`post`/`delete` verbs of
//! [`AreaSession`] under the `/ip/v3` prefix.

#![deny(missing_docs)]

pub use vmmanager_core::AreaSession;
use vmmanager_core::{ApiDefinition, ApiSession, SessionConfig};

/// Convenient result alias that reuses the shared VMmanager error type.
pub type Result<T> = vmmanager_core::Result<T>;

/// Session for the IPmanager API (`/ip/v3`).
#[derive(Debug)]
pub struct IpSession {
    inner: ApiSession,
}

impl IpSession {
    /// Open a session against `config.base_url` at `/ip/v3`.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Self::open(config)
    }
}

impl AreaSession for IpSession {
    const DEFINITION: ApiDefinition = ApiDefinition::Ip;

    fn from_session(session: ApiSession) -> Self {
        Self { inner: session }
    }

    fn session(&self) -> &ApiSession {
        &self.inner
    }

    fn into_session(self) -> ApiSession {
        self.inner
    }
}

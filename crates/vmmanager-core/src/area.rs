//! Area session abstraction.
//!
//! Each API area (auth, vm, ip, dnsproxy) is a thin wrapper holding one
//! [`ApiSession`]. Implementing [`AreaSession`] gives the wrapper the
//! forwarded `get`/`post`/`delete` verbs and the open/close lifecycle, so the
//! wrapper only has to add its convenience methods.

use crate::client::{ApiSession, ConnectionHandle, RequestOptions, SessionFuture};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::types::{ApiArea, ApiDefinition};
use async_trait::async_trait;
use serde_json::Value;

/// Behaviour shared by every area wrapper.
#[async_trait]
pub trait AreaSession: Send + Sync + Sized {
    /// The API definition this wrapper targets.
    const DEFINITION: ApiDefinition;

    /// Wrap an already opened session.
    fn from_session(session: ApiSession) -> Self;

    /// Borrow the underlying session.
    fn session(&self) -> &ApiSession;

    /// Unwrap the underlying session.
    fn into_session(self) -> ApiSession;

    /// Open a session at the default version of [`Self::DEFINITION`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    fn open(config: &SessionConfig) -> Result<Self> {
        Self::open_with_area(config, ApiArea::for_definition(Self::DEFINITION))
    }

    /// Open a session with an explicit definition/version pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    fn open_with_area(config: &SessionConfig, area: ApiArea) -> Result<Self> {
        ApiSession::open(config, area).map(Self::from_session)
    }

    /// Release the connection.
    fn close(self) {
        self.into_session().close();
    }

    /// Observe the connection lifecycle.
    fn connection(&self) -> ConnectionHandle {
        self.session().connection()
    }

    /// HTTP GET relative to the area prefix.
    async fn get(&self, path: &str, options: RequestOptions) -> Result<Value> {
        self.session().get(path, options).await
    }

    /// HTTP POST relative to the area prefix.
    async fn post(&self, path: &str, options: RequestOptions) -> Result<Value> {
        self.session().post(path, options).await
    }

    /// HTTP DELETE relative to the area prefix.
    async fn delete(&self, path: &str, options: RequestOptions) -> Result<Value> {
        self.session().delete(path, options).await
    }
}

/// Open an area session, run `f` with it and release the connection on every
/// exit path.
///
/// # Errors
///
/// Returns the error from opening the session or from `f`.
pub async fn with_session<S, T, F>(config: &SessionConfig, f: F) -> Result<T>
where
    S: AreaSession,
    F: for<'s> FnOnce(&'s S) -> SessionFuture<'s, T>,
{
    let session = S::open(config)?;
    let outcome = f(&session).await;
    session.close();
    outcome
}

//! Auth API session for VMmanager 6.
//!
//! Provides [`AuthSession`] for obtaining session tokens, user keys and the
//! identity of the current session.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::AuthSession;
pub use models::{AuthToken, Credentials};
pub use vmmanager_core::AreaSession;

/// Convenient result alias that reuses the shared VMmanager error type.
pub type Result<T> = vmmanager_core::Result<T>;

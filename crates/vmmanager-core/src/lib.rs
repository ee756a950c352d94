//! # vmmanager-core
//!
//! Session primitive and shared types for the VMmanager 6 REST API.
//!
//! Every API area is reached through an [`ApiSession`]: a scoped owner of one
//! HTTP connection pool that composes request URLs from the platform base URL
//! and the area prefix, forwards request options to `reqwest`, and turns every
//! response into either decoded JSON or an [`Error`].
//!
//! ## Modules
//!
//! - [`client`] - The session primitive, request options and URL composition
//! - [`area`] - The trait implemented by per-area session wrappers
//! - [`config`] - Session configuration
//! - [`error`] - Error type
//! - [`ids`] - Strongly-typed resource identifiers
//! - [`query`] - Query string and filter expression helpers
//! - [`types`] - API definitions and path prefixes

#![deny(missing_docs)]
#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod area;
pub mod client;
pub mod config;
pub mod error;
pub mod ids;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use area::{with_session, AreaSession};
pub use client::{ApiSession, ConnectionHandle, RequestOptions, SessionFuture};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use query::{Filter, QueryParams};
pub use reqwest::Method;
pub use serde_json::Value;
pub use types::{ApiArea, ApiDefinition};

//! VM API session for VMmanager 6.
//!
//! Provides [`VmSession`] for the host lifecycle (create, edit, delete) and
//! for looking tasks up in the task manager.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::VmSession;
pub use models::{HostOperation, ListResponse};
pub use vmmanager_core::AreaSession;

/// Convenient result alias that reuses the shared VMmanager error type.
pub type Result<T> = vmmanager_core::Result<T>;

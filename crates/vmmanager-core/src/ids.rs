//! Strongly-typed identifiers for VMmanager resources.
//!
//! VMmanager identifies hosts, tasks and users with integers. Wrapping them
//! keeps a host id from being passed where a task id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::query::encode_path_segment;

/// Macro to generate integer identifier wrapper types.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $doc:expr) => {
        $(#[$meta])*
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| Error::InvalidId(s.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(HostId, "Virtual machine (host) identifier");
id_type!(TaskId, "Task manager task identifier");
id_type!(ConsulId, "Correlation identifier returned for long-running operations");
id_type!(UserId, "User account identifier");

/// A user addressed either by email or by numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRef {
    /// Address by email
    Email(String),
    /// Address by id
    Id(UserId),
}

impl UserRef {
    /// The reference as a single escaped URL path segment.
    #[must_use]
    pub fn path_segment(&self) -> String {
        match self {
            Self::Email(email) => encode_path_segment(email),
            Self::Id(id) => id.to_string(),
        }
    }
}

impl From<&str> for UserRef {
    fn from(value: &str) -> Self {
        value
            .parse::<UserId>()
            .map_or_else(|_| Self::Email(value.to_string()), Self::Id)
    }
}

impl From<String> for UserRef {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<UserId> for UserRef {
    fn from(id: UserId) -> Self {
        Self::Id(id)
    }
}

impl From<u64> for UserRef {
    fn from(id: u64) -> Self {
        Self::Id(UserId::new(id))
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(email) => f.write_str(email),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

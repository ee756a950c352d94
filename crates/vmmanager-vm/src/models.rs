//! Response shapes used by the VM API session.
//!
//! Bodies are returned to callers as raw JSON; these types only cover the
//! envelope fields the session itself needs to read.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vmmanager_core::ids::{ConsulId, HostId};
use vmmanager_core::Error;

/// Paged list envelope, `{"list": [...], "size": n}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListResponse {
    /// Matching records
    #[serde(default)]
    pub list: Vec<Value>,

    /// Total number of matching records, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ListResponse {
    /// Read the records out of a decoded body.
    ///
    /// Accepts both the `{"list": [...]}` envelope and a bare array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for any other shape.
    pub fn from_body(url: &str, body: Value) -> Result<Self, Error> {
        let is_envelope = body.get("list").is_some();
        match body {
            Value::Array(list) => Ok(Self { list, size: None }),
            envelope if is_envelope => serde_json::from_value(envelope)
                .map_err(|err| Error::Decode {
                    url: url.to_string(),
                    message: err.to_string(),
                }),
            other => Err(Error::Decode {
                url: url.to_string(),
                message: format!("expected a task list, got {other}"),
            }),
        }
    }
}

/// Reply to host lifecycle operations, `{"id": 12, "task": 1488228}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostOperation {
    /// Affected host
    #[serde(default)]
    pub id: Option<HostId>,

    /// Correlation id of the task started by the operation
    #[serde(default)]
    pub task: Option<ConsulId>,
}

impl HostOperation {
    /// Read the operation reply out of a decoded body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body is not an object with integer
    /// `id`/`task` fields.
    pub fn from_body(url: &str, body: &Value) -> Result<Self, Error> {
        Self::deserialize(body).map_err(|err| Error::Decode {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

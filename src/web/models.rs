//! Request and response types for the command API.

use serde::{Deserialize, Serialize};

/// A remote method invocation: a name plus a string-encoded payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    pub name: String,
    #[serde(default)]
    pub payload: String,
}

/// Command outcome in the shape the cloud side expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    #[serde(rename = "Response")]
    pub response: String,
}

impl CommandResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

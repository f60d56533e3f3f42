// scenebridge/scenebridge-proto/src/proto/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Command and response messages.
//!
//! Both directions carry exactly one JSON object per line:
//!
//! ```text
//! {"type": "create_object", "params": {"object_type": "CUBE"}}
//! {"status": "success", "result": {"name": "Cube", "type": "CUBE"}}
//! {"status": "error", "message": "Unknown command: explode"}
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Parameters of a command, keyed by field name.
pub type Params = Map<String, Value>;

/// A command sent by a client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Command {
    /// Registered command name, e.g. `"get_scene_info"`, `"create_object"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Command parameters. Absent or `null` on the wire means empty.
    #[serde(
        default,
        deserialize_with = "deserialize_params",
        skip_serializing_if = "Map::is_empty"
    )]
    pub params: Params,
}

impl Command {
    /// Create a command without parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Params::new(),
        }
    }

    /// Create a command with the given parameters.
    pub fn with_params(kind: impl Into<String>, params: Params) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }

    /// Builder-style helper to add a single parameter.
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

fn deserialize_params<'de, D>(deserializer: D) -> Result<Params, D::Error>
where
    D: Deserializer<'de>,
{
    let params: Option<Params> = Option::deserialize(deserializer)?;
    Ok(params.unwrap_or_default())
}

/// A response returned by the server for exactly one command.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    /// The command completed; `result` carries its output.
    Success {
        #[serde(default)]
        result: Value,
    },

    /// The command failed; `message` says why.
    Error {
        #[serde(default)]
        message: String,
    },
}

impl Response {
    /// Create a successful response.
    pub fn success(result: impl Into<Value>) -> Self {
        Response::Success {
            result: result.into(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// The wire value of the `status` field.
    pub fn status(&self) -> &'static str {
        match self {
            Response::Success { .. } => "success",
            Response::Error { .. } => "error",
        }
    }

    /// The result of a successful response.
    pub fn result(&self) -> Option<&Value> {
        match self {
            Response::Success { result } => Some(result),
            Response::Error { .. } => None,
        }
    }

    /// The message of an error response.
    pub fn message(&self) -> Option<&str> {
        match self {
            Response::Success { .. } => None,
            Response::Error { message } => Some(message),
        }
    }

    /// Converts into a `Result`, mapping the error message to `Err`.
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            Response::Success { result } => Ok(result),
            Response::Error { message } => Err(message),
        }
    }
}

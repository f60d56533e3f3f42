// scenebridge/src/error/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Centralized error handling for Scenebridge.
//!
//! Uses `thiserror` to define structured errors and `anyhow` for convenient propagation.
//! Library modules return `Result<T, BridgeError>`; binaries use
//! `anyhow::Result<T>` (re-exported as `AnyResult`) at the top level.
//!
//! Per-command failures are [`HandlerError`]s. They never travel further than
//! the command registry, which turns them into error responses.

use std::path::PathBuf;
use thiserror::Error;
use tokio::task::JoinError;

use scenebridge_proto::ProtoError;

use crate::script::ScriptError;

/// The root error type for all Scenebridge-specific failures.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// General-purpose error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O error (bind failure, connection reset, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// IO error with associated path for better diagnostics
    #[error("I/O error at {path:?}: {source}")]
    IoWithPath {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Wire framing or decoding error.
    #[error("Protocol error: {0}")]
    Proto(#[from] ProtoError),

    /// Configuration loading or parsing error.
    #[error("Config error: {0}")]
    Config(String),

    /// TOML syntax error in a configuration file.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The host application's main context is not accepting work.
    #[error("Host error: {0}")]
    Host(String),

    /// Task join error.
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
}

impl BridgeError {
    pub fn io_with_path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoWithPath {
            source,
            path: path.into(),
        }
    }
}

/// Convenient alias for `Result<T, BridgeError>`.
pub type Result<T> = std::result::Result<T, BridgeError>;

pub use anyhow::Result as AnyResult;

/// Failure of a single command handler.
///
/// The `Display` text becomes the `message` of the error response.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    /// A required parameter is absent or `null`.
    #[error("Missing required parameter '{0}'")]
    MissingParam(String),

    /// A parameter has the wrong JSON type or shape.
    #[error("Invalid parameter '{name}': expected {expected}")]
    InvalidParam { name: String, expected: String },

    /// A referenced scene item does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// The request names a type or mode the host does not support.
    #[error("{0}")]
    Unsupported(String),

    /// The scene script failed to parse or run.
    #[error("{0}")]
    Script(#[from] ScriptError),

    /// Any other handler failure.
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    pub fn object_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Object",
            name: name.into(),
        }
    }

    pub fn material_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Material",
            name: name.into(),
        }
    }
}

pub type HandlerResult<T> = std::result::Result<T, HandlerError>;

// scenebridge/scenebridge-proto/src/error.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Errors produced while framing, encoding or decoding wire messages.
#[derive(Error, Debug)]
pub enum ProtoError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The frame is not valid JSON for the expected message.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No delimiter was seen within `limit` bytes.
    #[error("Request too large (limit {limit} bytes)")]
    FrameTooLarge { limit: usize },

    /// The peer closed the stream in the middle of a frame.
    #[error("Connection closed with {buffered} bytes of an unterminated frame")]
    UnexpectedEof { buffered: usize },
}

impl ProtoError {
    /// Whether the error leaves the stream unusable.
    ///
    /// Decode and size errors concern a single frame; the connection stays open.
    pub fn is_transport(&self) -> bool {
        matches!(self, ProtoError::Io(_) | ProtoError::UnexpectedEof { .. })
    }
}

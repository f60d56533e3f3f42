// scenebridge/scenebridge-proto/src/codec/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Newline framing for wire messages.
//!
//! Every message is a single JSON object followed by one `\n`. The compact
//! JSON encoding escapes newlines inside strings, so the first `\n` in the
//! byte stream always ends the current frame.
//!
//! [`FrameDecoder`] is the pure buffering half: bytes go in as they arrive
//! from the socket, complete frames come out one at a time. [`FrameReader`]
//! wraps an [`AsyncRead`] and pulls bytes until a full frame is available.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtoError, Result};

/// Maximum accepted frame length in bytes, delimiter excluded.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 64 * 1024; // 64 KB

const READ_CHUNK_SIZE: usize = 4096;

/// Serializes a message to JSON and appends the `\n` delimiter.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let mut json = serde_json::to_vec(message)?;
    json.push(b'\n');
    Ok(json)
}

/// Parses one frame. A trailing `\n` or `\r\n` is tolerated.
pub fn decode<T: DeserializeOwned>(frame: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(trim_line_end(frame))?)
}

/// Whether a frame holds nothing but whitespace.
pub fn is_blank(frame: &[u8]) -> bool {
    frame.iter().all(u8::is_ascii_whitespace)
}

fn trim_line_end(frame: &[u8]) -> &[u8] {
    let mut end = frame.len();
    while end > 0 && matches!(frame[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &frame[..end]
}

/// Accumulates raw bytes and splits them into frames.
///
/// Bytes after the first delimiter stay buffered for the next call to
/// [`FrameDecoder::next_frame`]. A frame longer than the limit is dropped
/// up to its delimiter and reported once as [`ProtoError::FrameTooLarge`].
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    max_length: usize,
    discarding: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LENGTH)
    }
}

impl FrameDecoder {
    pub fn new(max_length: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_length,
            discarding: false,
        }
    }

    /// Appends bytes received from the stream.
    pub fn extend(&mut self, bytes: &[u8]) {
        if self.discarding && self.buffer.is_empty() {
            // Skip the rest of an oversized frame without buffering it.
            if let Some(pos) = bytes.iter().position(|b| *b == b'\n') {
                self.buffer.extend_from_slice(&bytes[pos..]);
            }
        } else {
            self.buffer.extend_from_slice(bytes);
        }
    }

    /// Takes the next complete frame, without its delimiter.
    ///
    /// Returns `Ok(None)` when more bytes are needed.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut frame: Vec<u8> = self.buffer.drain(..=pos).collect();
            frame.pop();
            if std::mem::take(&mut self.discarding) || frame.len() > self.max_length {
                return Err(ProtoError::FrameTooLarge {
                    limit: self.max_length,
                });
            }
            return Ok(Some(frame));
        }

        if self.buffer.len() > self.max_length {
            self.buffer.clear();
            self.discarding = true;
        }
        Ok(None)
    }

    /// Number of bytes waiting for a delimiter.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }
}

/// Reads frames from an async byte stream.
pub struct FrameReader<R> {
    inner: R,
    decoder: FrameDecoder,
    chunk: Box<[u8]>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_length(inner, DEFAULT_MAX_FRAME_LENGTH)
    }

    pub fn with_max_length(inner: R, max_length: usize) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::new(max_length),
            chunk: vec![0u8; READ_CHUNK_SIZE].into_boxed_slice(),
        }
    }

    /// Reads until one complete frame is available.
    ///
    /// Returns `Ok(None)` on a clean end of stream (no partial frame pending).
    /// Cancelling the returned future never loses bytes already received.
    pub async fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(frame) = self.decoder.next_frame()? {
                return Ok(Some(frame));
            }

            let n = self.inner.read(&mut self.chunk).await?;
            if n == 0 {
                let buffered = self.decoder.buffered();
                self.decoder.clear();
                if buffered == 0 {
                    return Ok(None);
                }
                return Err(ProtoError::UnexpectedEof { buffered });
            }
            self.decoder.extend(&self.chunk[..n]);
        }
    }

    /// Reads one frame and decodes it as `T`.
    pub async fn read_message<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.read_frame().await? {
            Some(frame) => Ok(Some(decode(&frame)?)),
            None => Ok(None),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Encodes a message and writes it, delimiter included, then flushes.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let bytes = encode(message)?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

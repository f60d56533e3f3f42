// scenebridge/scenebridge-proto/src/lib.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Scenebridge wire protocol definitions.
//!
//! This crate defines the request/response structures and the newline
//! framing shared by the server embedded in the host application and the
//! clients that drive it (orchestrator, CLI, tests).

pub mod codec;
pub mod error;
pub mod proto;

pub use codec::{decode, encode, FrameDecoder, FrameReader, write_frame, DEFAULT_MAX_FRAME_LENGTH};
pub use error::{ProtoError, Result};
pub use proto::{Command, Params, Response};

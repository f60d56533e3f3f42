// scenebridge/src/lib.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Scenebridge: drive a long-lived creative application over a socket.
//!
//! An orchestrator sends newline-framed JSON [`Command`]s to a [`server`]
//! embedded in the host application; each is dispatched through a
//! [`registry::CommandRegistry`] onto the host's main context and answered
//! with exactly one [`Response`]. The [`client`] module is the orchestrator
//! side of the connection.

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod history;
pub mod host;
pub mod log;
pub mod registry;
pub mod scene;
pub mod script;
pub mod server;
pub mod translator;

pub use scenebridge_proto::{Command, Params, Response};

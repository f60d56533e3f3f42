// scenebridge/src/registry/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Command registry: maps command names to handlers and dispatches them.
//!
//! Every entry declares its parameters with a [`ParamSchema`]. Parameters are
//! validated before the handler runs, so a bad request never reaches the scene.
//!
//! Two kinds of handler exist:
//! - [`HandlerKind::Scene`] runs on the main context with the scene borrowed mutably.
//! - [`HandlerKind::Translate`] turns its parameters into another [`Command`],
//!   which is then dispatched once. A translation that produces another
//!   translation is rejected.

pub mod params;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use scenebridge_proto::{Command, Params, Response};

use crate::error::HandlerResult;
use crate::host::HostHandle;
use crate::scene::Scene;

pub use params::{ParamSchema, ParamSpec, ParamType, ParamsExt};

pub type SceneHandler = fn(&mut Scene, &Params) -> HandlerResult<Value>;
pub type TranslateHandler = fn(&Params) -> HandlerResult<Command>;
pub type Describe = fn(&Params) -> String;

#[derive(Clone, Copy)]
pub enum HandlerKind {
    Scene(SceneHandler),
    Translate(TranslateHandler),
}

impl std::fmt::Debug for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerKind::Scene(_) => f.write_str("Scene"),
            HandlerKind::Translate(_) => f.write_str("Translate"),
        }
    }
}

#[derive(Clone)]
pub struct HandlerEntry {
    pub name: &'static str,
    pub summary: &'static str,
    pub schema: ParamSchema,
    pub kind: HandlerKind,
    describe: Option<Describe>,
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("schema", &self.schema)
            .finish()
    }
}

impl HandlerEntry {
    pub fn scene(name: &'static str, summary: &'static str, handler: SceneHandler) -> Self {
        Self {
            name,
            summary,
            schema: ParamSchema::new(),
            kind: HandlerKind::Scene(handler),
            describe: None,
        }
    }

    pub fn translate(name: &'static str, summary: &'static str, handler: TranslateHandler) -> Self {
        Self {
            name,
            summary,
            schema: ParamSchema::new(),
            kind: HandlerKind::Translate(handler),
            describe: None,
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.schema = self.schema.param(spec);
        self
    }

    /// Sets the history description builder. Defaults to the summary.
    pub fn describe_with(mut self, describe: Describe) -> Self {
        self.describe = Some(describe);
        self
    }

    pub fn describe(&self, params: &Params) -> String {
        match self.describe {
            Some(describe) => describe(params),
            None => self.summary.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    entries: IndexMap<&'static str, HandlerEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command.
    pub fn builtin() -> Self {
        crate::handlers::builtin()
    }

    /// Adds an entry, replacing any previous entry of the same name.
    pub fn register(&mut self, entry: HandlerEntry) -> &mut Self {
        if self.entries.insert(entry.name, entry).is_some() {
            debug!("Replaced existing handler");
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&HandlerEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Human-readable history line for `command`.
    pub fn describe(&self, command: &Command) -> String {
        match self.entries.get(command.kind.as_str()) {
            Some(entry) => entry.describe(&command.params),
            None => unknown_command(&command.kind),
        }
    }

    /// Validates and runs `command`. Never fails; failures become error responses.
    pub async fn dispatch(&self, command: &Command, host: &HostHandle) -> Response {
        let entry = match self.entries.get(command.kind.as_str()) {
            Some(entry) => entry,
            None => {
                warn!(command = %command.kind, "Unknown command");
                return Response::error(unknown_command(&command.kind));
            }
        };
        let params = match entry.schema.validate(&command.params) {
            Ok(params) => params,
            Err(e) => return Response::error(e.to_string()),
        };

        match entry.kind {
            HandlerKind::Scene(handler) => run_scene_handler(handler, params, host).await,
            HandlerKind::Translate(translate) => {
                let translated = match translate(&params) {
                    Ok(translated) => translated,
                    Err(e) => return Response::error(e.to_string()),
                };
                debug!(from = entry.name, to = %translated.kind, "Dispatching translated command");
                self.dispatch_translated(&translated, host).await
            }
        }
    }

    async fn dispatch_translated(&self, command: &Command, host: &HostHandle) -> Response {
        let entry = match self.entries.get(command.kind.as_str()) {
            Some(entry) => entry,
            None => return Response::error(unknown_command(&command.kind)),
        };
        let params = match entry.schema.validate(&command.params) {
            Ok(params) => params,
            Err(e) => return Response::error(e.to_string()),
        };
        match entry.kind {
            HandlerKind::Scene(handler) => run_scene_handler(handler, params, host).await,
            HandlerKind::Translate(_) => Response::error(format!(
                "Command '{}' cannot be the result of a translation",
                command.kind
            )),
        }
    }
}

async fn run_scene_handler(handler: SceneHandler, params: Params, host: &HostHandle) -> Response {
    match host.run_on_main(move |scene| handler(scene, &params)).await {
        Ok(Ok(result)) => Response::success(result),
        Ok(Err(e)) => Response::error(e.to_string()),
        Err(e) => Response::error(e.to_string()),
    }
}

pub fn unknown_command(name: &str) -> String {
    format!("Unknown command: {}", name)
}

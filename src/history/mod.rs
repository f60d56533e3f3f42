// scenebridge/src/history/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Bounded diagnostic history.
//!
//! [`Diagnostics`] keeps the most recent commands and lifecycle events
//! (newest first, capped at a fixed count) and a single last-error slot that
//! every failure overwrites. A [`DiagnosticsSnapshot`] is the read-only JSON
//! document exported for offline inspection.

use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::{BridgeError, Result as BridgeResult};

/// Default number of history entries kept.
pub const MAX_HISTORY_ITEMS: usize = 10;

pub(crate) fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "<invalid-timestamp>".to_string())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub command: String,
    pub params: Value,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LastError {
    pub timestamp: String,
    pub command: String,
    pub error: String,
    pub details: String,
}

/// Newest-first ring of history entries.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Inserts at the head and drops the oldest entries beyond capacity.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// History ring plus last-error slot.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    history: HistoryRing,
    last_error: Option<LastError>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(MAX_HISTORY_ITEMS)
    }
}

impl Diagnostics {
    pub fn new(max_items: usize) -> Self {
        Self {
            history: HistoryRing::new(max_items),
            last_error: None,
        }
    }

    pub fn record(&mut self, command: &str, params: Value, description: impl Into<String>) {
        self.history.push(HistoryEntry {
            timestamp: timestamp_now(),
            command: command.to_string(),
            params,
            description: description.into(),
        });
    }

    /// Overwrites the last-error slot.
    pub fn record_error(&mut self, command: &str, error: impl Into<String>, details: impl Into<String>) {
        self.last_error = Some(LastError {
            timestamp: timestamp_now(),
            command: command.to_string(),
            error: error.into(),
            details: details.into(),
        });
    }

    pub fn history(&self) -> &HistoryRing {
        &self.history
    }

    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    /// Clears history and the last-error slot together.
    pub fn clear(&mut self) {
        self.history.clear();
        self.last_error = None;
    }

    pub fn snapshot(&self, connection: ConnectionInfo) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            timestamp: timestamp_now(),
            connection,
            last_error: self.last_error.clone(),
            history: self.history.to_vec(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub is_running: bool,
    /// Peer address of the attached client, if any.
    pub client: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DiagnosticsSnapshot {
    pub timestamp: String,
    pub connection: ConnectionInfo,
    pub last_error: Option<LastError>,
    pub history: Vec<HistoryEntry>,
}

impl DiagnosticsSnapshot {
    /// Writes the snapshot as pretty-printed JSON.
    pub async fn export(&self, path: &Path) -> BridgeResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| BridgeError::io_with_path(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_ring_keeps_most_recent_newest_first() {
        let mut diag = Diagnostics::new(MAX_HISTORY_ITEMS);
        for i in 0..(MAX_HISTORY_ITEMS + 5) {
            diag.record(&format!("cmd_{}", i), Value::Null, "");
        }

        let commands: Vec<_> = diag.history().iter().map(|e| e.command.clone()).collect();
        let expected: Vec<_> = (5..15).rev().map(|i| format!("cmd_{}", i)).collect();
        assert_eq!(diag.history().len(), MAX_HISTORY_ITEMS);
        assert_eq!(commands, expected);
    }

    #[test]
    fn test_last_error_survives_success_until_next_error() {
        let mut diag = Diagnostics::default();
        assert!(diag.last_error().is_none());

        diag.record_error("delete_object", "Object 'Cube' not found", "Command failed: delete_object");
        diag.record("get_objects", Value::Null, "Retrieving all objects");
        assert_eq!(diag.last_error().unwrap().command, "delete_object");

        diag.record_error("json_error", "Invalid JSON", "{ nope");
        let last = diag.last_error().unwrap();
        assert_eq!(last.command, "json_error");
        assert_eq!(last.details, "{ nope");
    }

    #[test]
    fn test_huge_configured_capacity() {
        let (config, _) = crate::config::from_toml_str(
            "[history]\nmax_items = 9000000000000000000\n",
            std::path::Path::new("scenebridge.toml"),
        )
        .unwrap();
        let mut diag = Diagnostics::new(config.history.max_items);
        assert_eq!(diag.history().capacity(), 9_000_000_000_000_000_000);

        diag.record("a", Value::Null, "");
        diag.record("b", Value::Null, "");
        assert_eq!(diag.history().len(), 2);
        assert_eq!(diag.history().iter().next().unwrap().command, "b");
    }

    #[test]
    fn test_clear_resets_both() {
        let mut diag = Diagnostics::default();
        diag.record("get_scene_info", json!({}), "Retrieving scene info");
        diag.record_error("x", "y", "z");
        diag.clear();
        assert!(diag.history().is_empty());
        assert!(diag.last_error().is_none());
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut ring = HistoryRing::new(0);
        ring.push(HistoryEntry {
            timestamp: timestamp_now(),
            command: "a".into(),
            params: Value::Null,
            description: String::new(),
        });
        assert!(ring.is_empty());
    }

    #[tokio::test]
    async fn test_export_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scenebridge_debug.json");

        let mut diag = Diagnostics::default();
        diag.record("create_object", json!({"object_type": "CUBE"}), "Creating CUBE object");
        diag.record_error("create_object", "boom", "");

        let snapshot = diag.snapshot(ConnectionInfo {
            host: "127.0.0.1".into(),
            port: 9334,
            is_running: true,
            client: None,
        });
        snapshot.export(&path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["connection"]["port"], 9334);
        assert_eq!(parsed["last_error"]["error"], "boom");
        assert_eq!(parsed["history"][0]["command"], "create_object");
        assert_eq!(parsed["history"][0]["params"]["object_type"], "CUBE");
    }
}

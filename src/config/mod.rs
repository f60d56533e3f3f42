// scenebridge/src/config/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Layered configuration.
//!
//! The embedded `default_config.toml` is layer 0. A user file is merged over
//! it key by key; keys unknown to layer 0 are dropped with a warning, except
//! inside tables that accept new keys (`log.modules`).

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use toml::{Table, Value as TomlValue};

use crate::error::{BridgeError, Result as BridgeResult};
use crate::log::LogConfig;

const DEFAULT_CONFIG_CONTENT: &str = include_str!("default_config.toml");
const CONFIG_FILE_NAME: &str = "scenebridge.toml";

/// Tables whose keys are free-form and may be added by the user.
const NEWABLE_TABLES: &[&str] = &["log.modules"];

/// Non-fatal problem found while loading configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// The key does not exist in the default configuration and was ignored.
    UnknownKey { key: String, file: PathBuf },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::UnknownKey { key, file } => {
                write!(f, "{:?}: key '{}' ignored due to missing in default config", file, key)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BridgeConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub history: HistoryConfig,
    pub log: LogConfig,
    pub diagnostics: DiagnosticsConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            client: ClientConfig::default(),
            history: HistoryConfig::default(),
            log: LogConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

/// Listening side, embedded in the host application.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_bytes: usize,
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9334,
            max_request_bytes: scenebridge_proto::DEFAULT_MAX_FRAME_LENGTH,
            idle_timeout_secs: 0,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

/// Connecting side, used by the orchestrator and the CLI.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub response_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9334,
            connect_timeout_ms: 5000,
            response_timeout_ms: 30_000,
        }
    }
}

impl ClientConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryConfig {
    pub max_items: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: crate::history::MAX_HISTORY_ITEMS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(deserialize_with = "deserialize_optional_path")]
    pub export_path: Option<PathBuf>,
}

/// Helper: an empty string means "not set".
pub(crate) fn deserialize_optional_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok((!s.trim().is_empty()).then(|| PathBuf::from(s)))
}

/// Location of the per-user configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scenebridge").join(CONFIG_FILE_NAME))
}

/// Loads the configuration.
///
/// With an explicit `path` the file must exist. Without one, the per-user
/// file is used when present and the built-in defaults otherwise.
pub async fn load(path: Option<&Path>) -> BridgeResult<(BridgeConfig, Vec<ConfigWarning>)> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return from_layers(None),
        },
    };

    let content = fs::read_to_string(&path)
        .await
        .map_err(|e| BridgeError::io_with_path(&path, e))?;
    from_layers(Some((&content, &path)))
}

/// Parses a user configuration given as text.
pub fn from_toml_str(content: &str, source: &Path) -> BridgeResult<(BridgeConfig, Vec<ConfigWarning>)> {
    from_layers(Some((content, source)))
}

fn from_layers(user: Option<(&str, &Path)>) -> BridgeResult<(BridgeConfig, Vec<ConfigWarning>)> {
    let mut merged: Table = toml::from_str(DEFAULT_CONFIG_CONTENT)?;
    let mut warnings = Vec::new();

    if let Some((content, source)) = user {
        let layer: Table = toml::from_str(content)?;
        merge_tables(&mut merged, layer, "", source, &mut warnings);
    }

    let config = TomlValue::Table(merged)
        .try_into::<BridgeConfig>()
        .map_err(|e| BridgeError::Config(e.to_string()))?;
    Ok((config, warnings))
}

fn merge_tables(
    base: &mut Table,
    layer: Table,
    prefix: &str,
    source: &Path,
    warnings: &mut Vec<ConfigWarning>,
) {
    let newable = NEWABLE_TABLES.contains(&prefix);

    for (key, value) in layer {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match (base.get_mut(&key), value) {
            (Some(TomlValue::Table(base_table)), TomlValue::Table(layer_table)) => {
                merge_tables(base_table, layer_table, &full_key, source, warnings);
            }
            (Some(slot), value) => {
                *slot = value;
            }
            (None, value) if newable => {
                base.insert(key, value);
            }
            (None, _) => {
                warnings.push(ConfigWarning::UnknownKey {
                    key: full_key,
                    file: source.to_path_buf(),
                });
            }
        }
    }
}

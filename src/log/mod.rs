// scenebridge/src/log/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use crate::error::{BridgeError, Result as BridgeResult};

const LOG_FILE_NAME: &str = "scenebridge.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Installs the global tracing subscriber described by `config`.
///
/// When file output is enabled the returned guard owns the background
/// writer; dropping it flushes and stops file logging.
pub fn init(config: &LogConfig) -> BridgeResult<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(filter_directives(config))
        .map_err(|e| BridgeError::Config(format!("invalid log filter: {}", e)))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if config.file {
        let (layer, file_guard) = file_layer(config)?;
        layers.push(layer);
        guard = Some(file_guard);
    }
    if config.stderr {
        layers.push(fmt::layer().with_writer(std::io::stderr).with_ansi(true).boxed());
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| BridgeError::Internal(format!("failed to init tracing: {}", e)))?;

    Ok(guard)
}

/// Non-blocking writer to `<dir>/scenebridge.log`, never rotated.
fn file_layer(config: &LogConfig) -> BridgeResult<(BoxedLayer, WorkerGuard)> {
    let dir = config.log_dir();
    fs::create_dir_all(&dir).map_err(|e| BridgeError::io_with_path(&dir, e))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, LOG_FILE_NAME));
    let layer = fmt::layer().with_writer(writer).with_ansi(false);
    let layer: BoxedLayer = if config.structured {
        layer.json().boxed()
    } else {
        layer.boxed()
    };
    Ok((layer, guard))
}

/// Builds the `EnvFilter` directive string: the crate level first,
/// then per-target overrides in a stable order.
fn filter_directives(config: &LogConfig) -> String {
    let mut directives = vec![format!("scenebridge={}", config.default_level)];

    let mut targets: Vec<_> = config.modules.iter().collect();
    targets.sort_by(|a, b| a.0.cmp(b.0));
    for (target, level) in targets {
        directives.push(format!("{}={}", target, level));
    }

    directives.join(",")
}

fn parse_level<E: serde::de::Error>(level: &str) -> Result<LevelFilter, E> {
    level.parse::<LevelFilter>().map_err(E::custom)
}

fn deserialize_level_filter<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LevelFilter, D::Error> {
    parse_level(&String::deserialize(deserializer)?)
}

fn deserialize_module_levels<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HashMap<String, LevelFilter>, D::Error> {
    HashMap::<String, String>::deserialize(deserializer)?
        .into_iter()
        .map(|(target, level)| Ok((target, parse_level(&level)?)))
        .collect()
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_log_level", deserialize_with = "deserialize_level_filter")]
    pub default_level: LevelFilter,

    #[serde(default)]
    pub structured: bool,

    #[serde(default = "default_stderr")]
    pub stderr: bool,

    #[serde(default)]
    pub file: bool,

    #[serde(default, deserialize_with = "crate::config::deserialize_optional_path")]
    pub dir: Option<PathBuf>,

    #[serde(default, deserialize_with = "deserialize_module_levels")]
    pub modules: HashMap<String, LevelFilter>,
}

fn default_log_level() -> LevelFilter { LevelFilter::INFO }
fn default_stderr() -> bool { true }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: default_log_level(),
            structured: false,
            stderr: default_stderr(),
            file: false,
            dir: None,
            modules: HashMap::new(),
        }
    }
}

impl LogConfig {
    /// Directory of `scenebridge.log`.
    pub fn log_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("scenebridge")
                .join("log"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_order() {
        let mut config = LogConfig::default();
        config.modules.insert("scenebridge::server".to_string(), LevelFilter::TRACE);
        config.modules.insert("scenebridge::client".to_string(), LevelFilter::WARN);

        assert_eq!(
            filter_directives(&config).to_lowercase(),
            "scenebridge=info,scenebridge::client=warn,scenebridge::server=trace"
        );
        assert!(EnvFilter::try_new(filter_directives(&config)).is_ok());
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let err = toml::from_str::<LogConfig>("default_level = \"loud\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_module_levels() {
        let config: LogConfig = toml::from_str("[modules]\n\"scenebridge::server\" = \"debug\"\n").unwrap();
        assert_eq!(config.modules["scenebridge::server"], LevelFilter::DEBUG);
        assert!(toml::from_str::<LogConfig>("[modules]\nx = \"chatty\"\n").is_err());
    }

    #[test]
    fn test_explicit_log_dir() {
        let config: LogConfig = toml::from_str("dir = \"/var/log/scenebridge\"\n").unwrap();
        assert_eq!(config.log_dir(), PathBuf::from("/var/log/scenebridge"));
        assert!(config.stderr);
    }
}

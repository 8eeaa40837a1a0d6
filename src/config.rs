//! # Configuration Module
//!
//! [`AppConfig`] holds the knobs that shape dispatch and the worker pool. It
//! can be built in code, loaded from a YAML or TOML file, and then adjusted by
//! environment variables.
//!
//! ## File Format
//!
//! ```yaml
//! handle_method_not_allowed: true
//! not_found_body: "no such route"
//! workers: 8
//! stack_size: 0x20000
//! log:
//!   level: debug
//!   format: pretty
//! ```
//!
//! Every field is optional; missing fields keep their defaults.
//!
//! ## Environment Variables
//!
//! ### `SWITCHYARD_WORKERS`
//!
//! Number of worker coroutines. Default: `4`.
//!
//! ### `SWITCHYARD_STACK_SIZE`
//!
//! Stack size for worker coroutines. Accepts values in:
//! - Decimal: `65536` (64 KB)
//! - Hexadecimal: `0x10000` (64 KB)
//!
//! Default: `0x10000` (64 KB)
//!
//! ### `SWITCHYARD_METHOD_NOT_ALLOWED`
//!
//! `true` to answer 405 with an `Allow` header when a path matches only under
//! other methods. Default: `false` (404).
//!
//! Logging variables are described in [`crate::logging`].

use serde::{Deserialize, Deserializer};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logging::LogConfig;

/// Default worker coroutine count.
pub const DEFAULT_WORKERS: usize = 4;

/// Default coroutine stack size (64 KB).
pub const DEFAULT_STACK_SIZE: usize = 0x10000;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unsupported config extension for {0} (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(PathBuf),
    #[error("invalid value '{value}' for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Parse a size given in decimal or `0x`-prefixed hex.
#[must_use]
pub fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim();
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Number(usize),
    Text(String),
}

fn deserialize_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    match SizeRepr::deserialize(deserializer)? {
        SizeRepr::Number(n) => Ok(n),
        SizeRepr::Text(s) => parse_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size '{s}'"))),
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Answer 405 + `Allow` instead of 404 when only the method differs
    pub handle_method_not_allowed: bool,
    /// Message for the default not-found response
    pub not_found_body: Option<String>,
    /// Worker coroutines in a [`WorkerPool`](crate::WorkerPool)
    pub workers: usize,
    /// Stack size for worker coroutines in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub stack_size: usize,
    /// Logging settings
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            handle_method_not_allowed: false,
            not_found_body: None,
            workers: DEFAULT_WORKERS,
            stack_size: DEFAULT_STACK_SIZE,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a `.yaml`/`.yml` or `.toml` file. Environment overrides are
    /// not applied; call [`AppConfig::apply_env`] afterwards.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => {
                if text.trim().is_empty() {
                    return Ok(Self::default());
                }
                serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Some("toml") => toml::from_str(&text).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            }),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `SWITCHYARD_*` variables that are set.
    ///
    /// A set but unparseable variable is an error rather than silently ignored.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = env::var("SWITCHYARD_WORKERS") {
            self.workers = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "SWITCHYARD_WORKERS",
                value: value.clone(),
            })?;
        }
        if let Ok(value) = env::var("SWITCHYARD_STACK_SIZE") {
            self.stack_size = parse_size(&value).ok_or_else(|| ConfigError::InvalidEnv {
                var: "SWITCHYARD_STACK_SIZE",
                value: value.clone(),
            })?;
        }
        if let Ok(value) = env::var("SWITCHYARD_METHOD_NOT_ALLOWED") {
            self.handle_method_not_allowed =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    var: "SWITCHYARD_METHOD_NOT_ALLOWED",
                    value: value.clone(),
                })?;
        }
        self.log.apply_env();
        Ok(())
    }
}

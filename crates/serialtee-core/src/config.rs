//! Configuration for serialtee.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $SERIALTEE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/serialtee/config.toml
//!   3. ~/.config/serialtee/config.toml

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::segment::Source;
use crate::tee::TeeOptions;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeeConfig {
    pub forward: ForwardConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Sleep when the polled endpoint has nothing to read.
    pub idle_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Traffic log file. Relative paths resolve against the working directory.
    pub path: PathBuf,
    pub payload: PayloadFormat,
    /// Flush after every entry instead of only at shutdown.
    pub flush_each_entry: bool,
    /// Also emit every entry as a `tracing` event.
    pub echo: bool,
    /// Names written for endpoint A and B.
    pub label_a: String,
    pub label_b: String,
}

/// How a chunk is rendered in the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// `41 42 43 `
    #[default]
    Hex,
    /// `ABC`, with CR/LF escaped.
    Text,
}

impl PayloadFormat {
    pub fn render(self, chunk: &Chunk) -> String {
        match self {
            PayloadFormat::Hex => chunk.to_hex(),
            PayloadFormat::Text => chunk.to_text(),
        }
    }
}

impl FromStr for PayloadFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(PayloadFormat::Hex),
            "text" => Ok(PayloadFormat::Text),
            other => Err(ConfigError::InvalidValue("log.payload", other.to_string())),
        }
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            idle_interval_ms: 10,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("serialtee.log"),
            payload: PayloadFormat::Hex,
            flush_each_entry: true,
            echo: false,
            label_a: "PC".to_string(),
            label_b: "BUS".to_string(),
        }
    }
}

impl LogConfig {
    pub fn label(&self, source: Source) -> &str {
        match source {
            Source::A => &self.label_a,
            Source::B => &self.label_b,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("serialtee")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(&'static str, String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl TeeConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::parse(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            TeeConfig::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("SERIALTEE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&TeeConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Session options derived from this config.
    pub fn options(&self) -> TeeOptions {
        TeeOptions {
            idle_interval: Duration::from_millis(self.forward.idle_interval_ms),
            payload: self.log.payload,
        }
    }

    /// Apply SERIALTEE_* env var overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var("SERIALTEE_FORWARD__IDLE_INTERVAL_MS") {
            self.forward.idle_interval_ms = v
                .parse()
                .map_err(|_| ConfigError::InvalidValue("forward.idle_interval_ms", v))?;
        }
        if let Ok(v) = std::env::var("SERIALTEE_LOG__PATH") {
            self.log.path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SERIALTEE_LOG__PAYLOAD") {
            self.log.payload = v.parse()?;
        }
        if let Ok(v) = std::env::var("SERIALTEE_LOG__ECHO") {
            self.log.echo = v == "true" || v == "1";
        }
        Ok(())
    }
}

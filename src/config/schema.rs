//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! Every section has defaults, so an empty file is a valid configuration.

use super::error::{ConfigError, ConfigResult};
use crate::state::{
    ReceiveMode, SessionConfig, DEFAULT_BAUD_RATE, DEFAULT_SILENCE_THRESHOLD, DEFAULT_TERMINATOR,
    DEFAULT_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the registry cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.default_baud == 0 {
            return Err(ConfigError::validation(
                "serial.default_baud",
                "must be a positive integer",
            ));
        }
        if self.serial.default_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.default_timeout_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Baud rate applied to newly opened ports
    pub default_baud: u32,
    /// Read timeout in milliseconds
    pub default_timeout_ms: u64,
    /// Append `terminator` to every sent payload
    pub append_terminator: bool,
    /// Terminator byte
    pub terminator: u8,
    /// Consecutive empty reads that end a portion
    pub silence_threshold: u32,
    /// "portion" or "cumulative"
    pub receive_mode: ReceiveMode,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            default_baud: DEFAULT_BAUD_RATE,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            append_terminator: false,
            terminator: DEFAULT_TERMINATOR,
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            receive_mode: ReceiveMode::Portion,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Get the default timeout as Duration
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Initial session configuration for a registry.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            baud_rate: self.default_baud,
            timeout: self.default_timeout(),
            append_terminator: self.append_terminator,
            terminator: self.terminator,
            silence_threshold: self.silence_threshold,
            receive_mode: self.receive_mode,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

//! Configuration module for serial-links.
//!
//! This module provides TOML-based configuration with environment variable
//! overrides. Configuration is read once at startup; runtime parameter
//! changes made through the registry are never written back.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_LINKS_CONFIG` environment variable (explicit path)
//! 2. `./serial-links.toml` (current directory)
//! 3. `~/.config/serial-links/serial-links.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\serial-links\serial-links.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! - `SERIAL_LINKS_SERIAL_BAUD=115200`
//! - `SERIAL_LINKS_SERIAL_TIMEOUT_MS=200`
//! - `SERIAL_LINKS_SERIAL_APPEND_TERMINATOR=true`
//! - `SERIAL_LINKS_SERIAL_SILENCE_THRESHOLD=5`
//! - `SERIAL_LINKS_SERIAL_RECEIVE_MODE=portion`
//! - `SERIAL_LINKS_LOG_LEVEL=debug`, `SERIAL_LINKS_LOG_FORMAT=compact`
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_links::config::ConfigLoader;
//! use serial_links::PortRegistry;
//!
//! let loader = ConfigLoader::load()?;
//! let registry = PortRegistry::from_config(loader.config());
//! println!("{}", registry.describe());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig};

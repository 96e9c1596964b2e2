use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::port::PortConfiguration;

// Default configuration constants
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_TERMINATOR: u8 = 0x00;
/// Consecutive empty reads tolerated before a portion is considered finished.
pub const DEFAULT_SILENCE_THRESHOLD: u32 = 5;

/// How the receive loop reports incoming bytes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveMode {
    /// One event per byte with the running count of the current portion;
    /// the count restarts after a silence.
    #[default]
    Portion,
    /// One event per byte carrying the whole message received so far.
    /// Never resets for the lifetime of the session.
    Cumulative,
}

/// Session-wide settings held by a [`PortRegistry`](crate::registry::PortRegistry).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub baud_rate: u32,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Append `terminator` after every sent payload.
    pub append_terminator: bool,
    pub terminator: u8,
    pub silence_threshold: u32,
    pub receive_mode: ReceiveMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            append_terminator: false,
            terminator: DEFAULT_TERMINATOR,
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            receive_mode: ReceiveMode::Portion,
        }
    }
}

impl SessionConfig {
    /// 8N1 port configuration for newly created handles.
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration::new(self.baud_rate, self.timeout)
    }

    /// Payload as it goes on the wire.
    pub fn frame_payload(&self, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(payload.len() + 1);
        frame.extend_from_slice(payload);
        if self.append_terminator {
            frame.push(self.terminator);
        }
        frame
    }
}

/// Serialize a `Duration` as fractional seconds, the unit the front end shows.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert!(!config.append_terminator);
        assert_eq!(config.terminator, 0);
        assert_eq!(config.silence_threshold, 5);
        assert_eq!(config.receive_mode, ReceiveMode::Portion);
    }

    #[test]
    fn test_frame_payload_terminator_toggle() {
        let mut config = SessionConfig::default();
        assert_eq!(config.frame_payload(b"hi"), b"hi".to_vec());

        config.append_terminator = true;
        assert_eq!(config.frame_payload(b"hi"), vec![b'h', b'i', 0]);
    }

    #[test]
    fn test_timeout_serializes_as_seconds() {
        let config = SessionConfig {
            timeout: Duration::from_millis(200),
            ..SessionConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout"], 0.2);
        assert_eq!(json["receive_mode"], "portion");

        let back: SessionConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.timeout, Duration::from_millis(200));
    }
}

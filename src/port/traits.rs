//! Core traits for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait that lets real serial ports and mock
//! implementations sit in the same registry slot, and the `PortOpener` seam the
//! registry uses to create them.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration parameters for a serial port.
///
/// Links always run 8 data bits, no parity, 1 stop bit and no flow control;
/// only the baud rate and read timeout vary at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Read timeout.
    pub timeout: Duration,
}

impl PortConfiguration {
    /// 8N1 configuration with the given baud rate and read timeout.
    pub fn new(baud_rate: u32, timeout: Duration) -> Self {
        Self { baud_rate, timeout }
    }

    /// Builder for the OS device, with the fixed 8N1 frame format applied.
    pub(crate) fn builder(&self, port_name: &str) -> serialport::SerialPortBuilder {
        serialport::new(port_name, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .flow_control(serialport::FlowControl::None)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(self.timeout)
    }
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self::new(9600, Duration::from_secs(1))
    }
}

/// Trait for serial port I/O operations.
///
/// Reads block for at most the configured timeout. A closed adapter answers
/// every I/O call with [`PortError::NotOpen`].
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port in a single call.
    ///
    /// Returns the number of bytes actually written, which may be short.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Current baud rate.
    fn baud_rate(&self) -> u32;

    /// Change the baud rate of the open device.
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), PortError>;

    /// Current read timeout.
    fn timeout(&self) -> Duration;

    /// Set the read timeout for this port.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Whether the underlying device is still open.
    fn is_open(&self) -> bool;

    /// Release the underlying device. Closing twice is a no-op.
    fn close(&mut self);

    /// Push buffered output to the device.
    fn flush(&mut self) -> Result<(), PortError> {
        Ok(())
    }

    /// Read exactly one byte, waiting at most the configured timeout.
    ///
    /// Returns `Ok(None)` when the timeout expired with no data.
    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        let mut buf = [0u8; 1];
        match self.read_bytes(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.is_timeout() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Boxed adapter as stored in registry slots.
pub type PortAdapter = Box<dyn SerialPortAdapter>;

/// Factory used by the registry to open devices by name.
///
/// The system implementation opens OS serial devices; tests swap in
/// [`MockPortOpener`](super::MockPortOpener).
pub trait PortOpener: Send + Sync {
    /// Open `port_name` with the given configuration.
    fn open(&self, port_name: &str, config: &PortConfiguration) -> Result<PortAdapter, PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = PortConfiguration::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_new_sets_rate_and_timeout() {
        let config = PortConfiguration::new(115200, Duration::from_millis(200));
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.timeout, Duration::from_millis(200));
    }

    #[test]
    fn test_timeout_read_maps_to_none() {
        let mut port = super::super::MockSerialPort::new("MOCK0");
        port.set_timeout(Duration::from_millis(1)).unwrap();
        assert_eq!(port.read_byte().unwrap(), None);

        port.enqueue_read(b"z");
        assert_eq!(port.read_byte().unwrap(), Some(b'z'));
    }
}

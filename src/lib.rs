//! Serial Links Library
//!
//! This library drives two bidirectional serial links built from four port
//! slots: one transmit and one receive port per link. It covers port
//! discovery, opening and assigning ports, sending framed payloads and a
//! background receive engine that splits incoming bytes into portions
//! separated by line silence.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `discovery`: Enumeration of serial devices present on the host
//! - `error`: Unified error handling
//! - `port`: Port abstraction layer for serial communication
//! - `receive`: Background receive worker and portion segmentation
//! - `registry`: The four-slot port registry, the entry point for front ends
//! - `slot`: Slot and link identifiers
//! - `state`: Session-wide parameters
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_links::{Link, PortRegistry, SessionConfig, Slot};
//!
//! let registry = PortRegistry::new(SessionConfig::default());
//! registry.open_slot("/dev/ttyUSB0", Slot::Link1Tx)?;
//! registry.send(Link::One, b"hello")?;
//! # Ok::<(), serial_links::LinkError>(())
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod port;
pub mod receive;
pub mod registry;
pub mod slot;
pub mod state;

// Re-export commonly used types for convenience
pub use discovery::{list_available_ports, list_port_details, PortDescriptor, PortKind};
pub use error::{ApplyFailure, LinkError, LinkResult};
pub use port::{
    MockPortOpener, MockSerialPort, PortConfiguration, PortError, PortOpener, SerialPortAdapter,
    SyncSerialPort, SystemPortOpener,
};
pub use receive::{sink_fn, ReceiveEvent, ReceiveSink, ReceiveState};
pub use registry::{PortHandle, PortRegistry, RegistryReport, SlotReport};
pub use slot::{Link, Slot};
pub use state::{ReceiveMode, SessionConfig};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};

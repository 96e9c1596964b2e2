//! Port abstraction layer for serial communication.
//!
//! Provides the adapter trait, the `serialport`-backed implementation and a
//! mock, enabling dependency injection and hardware-free testing.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockPortOpener, MockSerialPort};
pub use sync_port::*;
pub use traits::*;

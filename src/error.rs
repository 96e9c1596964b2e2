use crate::port::PortError;
use crate::slot::{Link, Slot};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A specialized `Result` type for registry and receive operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Registry-level error type.
///
/// Everything except [`LinkError::ReadFault`] is returned synchronously by
/// the operation that caused it; read faults are raised on the receive worker
/// and reach the caller through the sink and [`take_fault`].
///
/// [`take_fault`]: crate::registry::PortRegistry::take_fault
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Port '{port}' is not found or it is unavailable: {source}")]
    PortUnavailable {
        port: String,
        #[source]
        source: PortError,
    },

    #[error("Invalid slot number {0}, expected 1-4")]
    InvalidSlot(u8),

    #[error("Invalid link number {0}, expected 1 or 2")]
    InvalidLink(u8),

    #[error("No open port in slot {0}")]
    NotOpen(Slot),

    #[error("Slot {0} is bound to the running receive session")]
    SlotBusy(Slot),

    #[error("A receive session is already running on link {0}")]
    ReceiveActive(Link),

    #[error("Short write on '{port}': {written} of {expected} bytes")]
    ShortWrite {
        port: String,
        written: usize,
        expected: usize,
    },

    #[error("Write to '{port}' failed: {source}")]
    WriteFault {
        port: String,
        #[source]
        source: PortError,
    },

    #[error("Read from '{port}' failed: {source}")]
    ReadFault {
        port: String,
        #[source]
        source: PortError,
    },

    #[error("Parameters not applied to {} port(s): {}", .0.len(), ApplyFailures(.0))]
    ParameterApply(Vec<ApplyFailure>),

    #[error("Failed to spawn receive worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Receive worker panicked")]
    WorkerPanicked,
}

/// One handle that rejected a `set_parameters` change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyFailure {
    pub slot: Slot,
    pub port: String,
    pub message: String,
}

impl fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.slot, self.port, self.message)
    }
}

struct ApplyFailures<'a>(&'a [ApplyFailure]);

impl fmt::Display for ApplyFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

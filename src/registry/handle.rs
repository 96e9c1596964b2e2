use crate::port::PortAdapter;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Adapter shared between a slot and the receive worker reading it.
pub type SharedPort = Arc<Mutex<PortAdapter>>;

/// An open serial device, ready to be assigned to a slot.
///
/// Dropping an unassigned handle backed by [`SyncSerialPort`] releases the
/// OS device. Mock adapters share state with their clones and stay open until
/// closed explicitly.
///
/// [`SyncSerialPort`]: crate::port::SyncSerialPort
pub struct PortHandle {
    name: String,
    port: SharedPort,
}

impl PortHandle {
    /// Wrap an already-open adapter.
    pub fn new(adapter: PortAdapter) -> Self {
        Self {
            name: adapter.name().to_string(),
            port: Arc::new(Mutex::new(adapter)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.port.lock().is_open()
    }

    pub fn baud_rate(&self) -> u32 {
        self.port.lock().baud_rate()
    }

    pub fn timeout(&self) -> Duration {
        self.port.lock().timeout()
    }

    pub(crate) fn shared(&self) -> SharedPort {
        Arc::clone(&self.port)
    }

    pub(crate) fn close(&self) {
        self.port.lock().close();
    }
}

impl fmt::Debug for PortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortHandle").field("name", &self.name).finish()
    }
}

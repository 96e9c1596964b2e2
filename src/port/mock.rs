//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates a blocking serial device without
//! hardware. Clones share state, so a test can keep one clone for inspection
//! while the registry owns another. Two mocks can be wired as a loopback pair,
//! which is how the send/receive scenarios are exercised end to end.

use super::error::PortError;
use super::traits::{PortAdapter, PortConfiguration, PortOpener, SerialPortAdapter};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Inner state of the mock port.
#[derive(Debug)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Expected write operations (for verification).
    expected_writes: VecDeque<Vec<u8>>,
    /// Error kind returned by the next read, if any.
    read_fault: Option<std::io::ErrorKind>,
    /// Maximum bytes accepted per write (simulates short writes).
    write_limit: Option<usize>,
    /// Whether baud rate / timeout changes should be refused.
    reject_reconfigure: bool,
    /// Port written bytes are delivered to.
    loopback: Option<Arc<MockShared>>,
    baud_rate: u32,
    timeout: Duration,
    open: bool,
    /// Number of open -> closed transitions.
    close_count: usize,
}

impl Default for MockPortState {
    fn default() -> Self {
        Self {
            read_queue: VecDeque::new(),
            write_log: Vec::new(),
            expected_writes: VecDeque::new(),
            read_fault: None,
            write_limit: None,
            reject_reconfigure: false,
            loopback: None,
            baud_rate: 9600,
            timeout: Duration::from_secs(1),
            open: true,
            close_count: 0,
        }
    }
}

#[derive(Debug, Default)]
struct MockShared {
    state: Mutex<MockPortState>,
    /// Signalled whenever bytes land in `read_queue` or the port closes.
    data_ready: Condvar,
}

impl MockShared {
    fn push_bytes(&self, data: &[u8]) {
        let mut state = self.state.lock();
        state.read_queue.extend(data);
        self.data_ready.notify_all();
    }
}

/// Mock serial port implementation for testing.
///
/// This implementation allows you to:
/// - Enqueue data to be returned by read operations
/// - Inspect what data was written
/// - Loop written data back into another mock
/// - Simulate read faults, short writes and refused reconfiguration
///
/// Reads on an empty queue block for the configured timeout, like a real
/// device, then report [`PortError::Timeout`].
///
/// # Example
/// ```
/// use serial_links::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
///
/// // Enqueue data to be read
/// port.enqueue_read(b"Hello, World!");
///
/// // Perform a read
/// let mut buffer = [0u8; 13];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(n, 13);
/// assert_eq!(&buffer[..n], b"Hello, World!");
///
/// // Write some data
/// port.write_bytes(b"Response").unwrap();
///
/// // Verify what was written
/// let writes = port.get_write_log();
/// assert_eq!(writes.len(), 1);
/// assert_eq!(writes[0], b"Response");
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    shared: Arc<MockShared>,
}

impl MockSerialPort {
    /// Create a new, open mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shared: Arc::new(MockShared::default()),
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.shared.push_bytes(data);
    }

    /// Deliver everything written to this port into `receiver`'s read queue.
    pub fn loopback_into(&self, receiver: &MockSerialPort) {
        let mut state = self.shared.state.lock();
        state.loopback = Some(Arc::clone(&receiver.shared));
    }

    /// Expect a specific write operation.
    ///
    /// A write that does not match the next expectation fails and is not logged.
    pub fn expect_write(&self, data: &[u8]) {
        let mut state = self.shared.state.lock();
        state.expected_writes.push_back(data.to_vec());
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.shared.state.lock().write_log.clone()
    }

    /// Make the next read fail with an I/O error of the given kind.
    pub fn fail_next_read(&self, kind: std::io::ErrorKind) {
        let mut state = self.shared.state.lock();
        state.read_fault = Some(kind);
        self.shared.data_ready.notify_all();
    }

    /// Accept at most `limit` bytes per write call.
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.shared.state.lock().write_limit = limit;
    }

    /// Refuse subsequent baud rate and timeout changes.
    pub fn set_reject_reconfigure(&self, reject: bool) {
        self.shared.state.lock().reject_reconfigure = reject;
    }

    /// How many times this port went from open to closed.
    pub fn close_count(&self) -> usize {
        self.shared.state.lock().close_count
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.shared.state.lock().read_queue.len()
    }

    /// Reopen with the given configuration, as the opener does on `open`.
    fn reopen(&self, config: &PortConfiguration) -> Result<(), PortError> {
        let mut state = self.shared.state.lock();
        if state.open {
            return Err(PortError::Io(std::io::Error::other(format!(
                "{} is busy",
                self.name
            ))));
        }
        state.open = true;
        state.baud_rate = config.baud_rate;
        state.timeout = config.timeout;
        state.read_queue.clear();
        Ok(())
    }

    /// Mark as closed without counting, so the opener can hand it out.
    fn park(&self) {
        self.shared.state.lock().open = false;
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let (accepted, loopback) = {
            let mut state = self.shared.state.lock();
            if !state.open {
                return Err(PortError::NotOpen);
            }

            if let Some(expected) = state.expected_writes.pop_front() {
                if expected != data {
                    return Err(PortError::config(format!(
                        "Expected write: {:?}, got: {:?}",
                        expected, data
                    )));
                }
            }

            let n = state.write_limit.map_or(data.len(), |l| l.min(data.len()));
            let accepted = data[..n].to_vec();
            state.write_log.push(accepted.clone());

            (accepted, state.loopback.clone())
        };

        // Own lock released first: a port may loop back into itself.
        if let Some(peer) = loopback {
            peer.push_bytes(&accepted);
        }

        Ok(accepted.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.shared.state.lock();
        let deadline = Instant::now() + state.timeout;

        loop {
            if !state.open {
                return Err(PortError::NotOpen);
            }
            if let Some(kind) = state.read_fault.take() {
                return Err(PortError::Io(std::io::Error::new(kind, "injected read fault")));
            }
            if !state.read_queue.is_empty() || buffer.is_empty() {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(PortError::timeout(state.timeout));
            }
            self.shared.data_ready.wait_for(&mut state, deadline - now);
        }

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }
        Ok(bytes_read)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn baud_rate(&self) -> u32 {
        self.shared.state.lock().baud_rate
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), PortError> {
        let mut state = self.shared.state.lock();
        if state.reject_reconfigure {
            return Err(PortError::config(format!(
                "{} refused baud rate {}",
                self.name, baud_rate
            )));
        }
        state.baud_rate = baud_rate;
        Ok(())
    }

    fn timeout(&self) -> Duration {
        self.shared.state.lock().timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        let mut state = self.shared.state.lock();
        if state.reject_reconfigure {
            return Err(PortError::config(format!(
                "{} refused timeout {:?}",
                self.name, timeout
            )));
        }
        state.timeout = timeout;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.shared.state.lock().open
    }

    fn close(&mut self) {
        let mut state = self.shared.state.lock();
        if state.open {
            state.open = false;
            state.close_count += 1;
            self.shared.data_ready.notify_all();
        }
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// [`PortOpener`] that hands out registered mocks by name.
///
/// Unknown names fail with [`PortError::NotFound`]; opening a mock that is
/// already open fails as a busy device would.
#[derive(Debug, Default)]
pub struct MockPortOpener {
    ports: Mutex<HashMap<String, MockSerialPort>>,
}

impl MockPortOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `port` available for opening under its name.
    ///
    /// The mock is parked in the closed state until the registry opens it;
    /// the caller keeps its clone for inspection.
    pub fn register(&self, port: &MockSerialPort) {
        port.park();
        self.ports.lock().insert(port.name.clone(), port.clone());
    }
}

impl PortOpener for MockPortOpener {
    fn open(&self, port_name: &str, config: &PortConfiguration) -> Result<PortAdapter, PortError> {
        let port = self
            .ports
            .lock()
            .get(port_name)
            .cloned()
            .ok_or_else(|| PortError::not_found(port_name))?;
        port.reopen(config)?;
        Ok(Box::new(port))
    }
}

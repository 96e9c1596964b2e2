//! Port registry.
//!
//! The registry owns four slots, the session configuration and the receive
//! engine. All front ends (the CLI, a GUI, tests) drive ports through it:
//!
//! ```text
//! discovery ──> create_port ──> assign(slot) ──┬──> send(link)
//!                                              └──> start_receiving(link, sink)
//! ```
//!
//! Locks are always taken in the order slots, receive session, port. The
//! receive worker only ever takes its own port lock.

mod handle;
mod report;

pub use handle::{PortHandle, SharedPort};
pub use report::{RegistryReport, SlotReport};

use crate::config::Config;
use crate::error::{ApplyFailure, LinkError, LinkResult};
use crate::port::{PortOpener, SystemPortOpener};
use crate::receive::{LoopSettings, ReceiveEngine, ReceiveSink, ReceiveState};
use crate::slot::{Link, Slot};
use crate::state::{ReceiveMode, SessionConfig};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Registry of the four link slots.
pub struct PortRegistry {
    opener: Box<dyn PortOpener>,
    config: RwLock<SessionConfig>,
    aliases: HashMap<String, String>,
    slots: Mutex<[Option<PortHandle>; 4]>,
    receiver: ReceiveEngine,
}

impl PortRegistry {
    /// Registry opening real OS serial devices.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_opener(config, SystemPortOpener)
    }

    /// Registry opening devices through `opener`.
    pub fn with_opener(config: SessionConfig, opener: impl PortOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            config: RwLock::new(config),
            aliases: HashMap::new(),
            slots: Mutex::new(Default::default()),
            receiver: ReceiveEngine::new(),
        }
    }

    /// Registry built from the loaded configuration file.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.serial.session_config()).with_aliases(config.serial.port_aliases.clone())
    }

    /// Resolve port names through `aliases` before opening.
    pub fn with_aliases(mut self, aliases: HashMap<String, String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Current session configuration.
    pub fn config(&self) -> SessionConfig {
        self.config.read().clone()
    }

    /// Toggle appending the terminator byte on send.
    pub fn set_append_terminator(&self, append: bool) {
        self.config.write().append_terminator = append;
    }

    /// Receive mode used by the next session.
    pub fn set_receive_mode(&self, mode: ReceiveMode) {
        self.config.write().receive_mode = mode;
    }

    // ========== Port lifecycle ==========

    /// Open `name` with the current baud rate, timeout and 8N1 framing.
    ///
    /// # Errors
    ///
    /// - `LinkError::PortUnavailable` if the device is missing, busy or not permitted
    pub fn create_port(&self, name: &str) -> LinkResult<PortHandle> {
        let device = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        let port_config = self.config.read().port_configuration();

        let adapter = self
            .opener
            .open(device, &port_config)
            .map_err(|source| LinkError::PortUnavailable {
                port: device.to_string(),
                source,
            })?;

        info!(
            "Opened {} at {} baud, timeout {:?}",
            device, port_config.baud_rate, port_config.timeout
        );
        Ok(PortHandle::new(adapter))
    }

    /// Install `handle` into `slot`, closing the previous occupant first.
    ///
    /// # Errors
    ///
    /// - `LinkError::SlotBusy` if `slot` is being read by the receive session;
    ///   the offered handle is closed
    pub fn assign(&self, handle: PortHandle, slot: Slot) -> LinkResult<()> {
        let mut slots = self.slots.lock();

        if self.receiver.bound_slot() == Some(slot) {
            handle.close();
            return Err(LinkError::SlotBusy(slot));
        }

        if let Some(previous) = slots[slot.index()].take() {
            debug!("Closing {} previously in {}", previous.name(), slot);
            previous.close();
        }
        info!("Assigned {} to {}", handle.name(), slot);
        slots[slot.index()] = Some(handle);
        Ok(())
    }

    /// Convenience for `create_port` followed by `assign`.
    pub fn open_slot(&self, name: &str, slot: Slot) -> LinkResult<()> {
        let handle = self.create_port(name)?;
        self.assign(handle, slot)
    }

    /// Update the baud rate and/or timeout and push them to every open handle.
    ///
    /// A zero baud rate or zero timeout means "leave unchanged". Each handle
    /// is tried even if an earlier one refused the change.
    ///
    /// # Errors
    ///
    /// - `LinkError::ParameterApply` listing every handle that refused
    pub fn set_parameters(
        &self,
        baud_rate: Option<u32>,
        timeout: Option<Duration>,
    ) -> LinkResult<()> {
        let baud_rate = baud_rate.filter(|b| *b > 0);
        let timeout = timeout.filter(|t| !t.is_zero());
        if baud_rate.is_none() && timeout.is_none() {
            return Ok(());
        }

        let slots = self.slots.lock();
        {
            let mut config = self.config.write();
            if let Some(b) = baud_rate {
                config.baud_rate = b;
            }
            if let Some(t) = timeout {
                config.timeout = t;
            }
        }

        let mut failures = Vec::new();
        for slot in Slot::ALL {
            let Some(handle) = &slots[slot.index()] else {
                continue;
            };
            let shared = handle.shared();
            let mut port = shared.lock();
            if !port.is_open() {
                continue;
            }

            let mut fail = |message: String| {
                failures.push(ApplyFailure {
                    slot,
                    port: handle.name().to_string(),
                    message,
                })
            };
            if let Some(b) = baud_rate {
                if let Err(e) = port.set_baud_rate(b) {
                    fail(e.to_string());
                }
            }
            if let Some(t) = timeout {
                if let Err(e) = port.set_timeout(t) {
                    fail(e.to_string());
                }
            }
        }

        if failures.is_empty() {
            info!(
                "Session parameters updated: baud {:?}, timeout {:?}",
                baud_rate, timeout
            );
            Ok(())
        } else {
            warn!("{} handle(s) rejected new parameters", failures.len());
            Err(LinkError::ParameterApply(failures))
        }
    }

    /// Close every open handle. Stops a running receive session first.
    ///
    /// Idempotent; empty and already-closed slots are skipped.
    ///
    /// # Errors
    ///
    /// - `LinkError::WorkerPanicked` if the receive worker had panicked; the
    ///   handles are closed regardless
    pub fn close_all(&self) -> LinkResult<()> {
        let mut slots = self.slots.lock();
        let stopped = self.receiver.end();

        for (slot, entry) in Slot::ALL.iter().zip(slots.iter_mut()) {
            if let Some(handle) = entry.take() {
                debug!("Closing {} in {}", handle.name(), slot);
                handle.close();
            }
        }
        stopped
    }

    /// Read-only snapshot of slots and session parameters.
    pub fn describe(&self) -> RegistryReport {
        let slots = self.slots.lock();
        let config = self.config.read().clone();

        let reports = Slot::ALL
            .iter()
            .map(|&slot| match &slots[slot.index()] {
                Some(handle) => {
                    let shared = handle.shared();
                    let port = shared.lock();
                    SlotReport {
                        slot,
                        number: slot.number(),
                        port: Some(handle.name().to_string()),
                        open: port.is_open(),
                        baud_rate: Some(port.baud_rate()),
                        timeout_secs: Some(port.timeout().as_secs_f64()),
                    }
                }
                None => SlotReport {
                    slot,
                    number: slot.number(),
                    port: None,
                    open: false,
                    baud_rate: None,
                    timeout_secs: None,
                },
            })
            .collect();

        RegistryReport {
            slots: reports,
            baud_rate: config.baud_rate,
            timeout_secs: config.timeout.as_secs_f64(),
            append_terminator: config.append_terminator,
            receive: self.receiver.state(),
        }
    }

    // ========== Send ==========

    /// Write `payload` to the link's transmit port.
    ///
    /// Returns `payload.len()`; an appended terminator is not counted.
    ///
    /// # Errors
    ///
    /// - `LinkError::NotOpen` if the transmit slot holds no open handle
    /// - `LinkError::ShortWrite` if the device accepted fewer bytes than offered
    /// - `LinkError::WriteFault` if the device write failed
    pub fn send(&self, link: Link, payload: &[u8]) -> LinkResult<usize> {
        let slot = link.tx_slot();
        let frame = self.config.read().frame_payload(payload);

        let slots = self.slots.lock();
        let handle = slots[slot.index()]
            .as_ref()
            .ok_or(LinkError::NotOpen(slot))?;
        let shared = handle.shared();
        let mut port = shared.lock();
        if !port.is_open() {
            return Err(LinkError::NotOpen(slot));
        }

        let write_fault = |source| LinkError::WriteFault {
            port: handle.name().to_string(),
            source,
        };
        let written = port.write_bytes(&frame).map_err(write_fault)?;
        if written < frame.len() {
            return Err(LinkError::ShortWrite {
                port: handle.name().to_string(),
                written,
                expected: frame.len(),
            });
        }
        port.flush().map_err(write_fault)?;

        debug!("Sent {} bytes on link {}", payload.len(), link);
        Ok(payload.len())
    }

    // ========== Receive ==========

    /// Start reading the link's receive port on a background worker.
    ///
    /// `sink` is called on the worker thread. Returns immediately.
    ///
    /// # Errors
    ///
    /// - `LinkError::ReceiveActive` if a session is already running
    /// - `LinkError::NotOpen` if the receive slot holds no open handle
    pub fn start_receiving<S: ReceiveSink>(&self, link: Link, sink: S) -> LinkResult<()> {
        let slot = link.rx_slot();
        let slots = self.slots.lock();

        if let ReceiveState::Running(active) = self.receiver.state() {
            return Err(LinkError::ReceiveActive(active));
        }
        let handle = slots[slot.index()]
            .as_ref()
            .filter(|h| h.is_open())
            .ok_or(LinkError::NotOpen(slot))?;

        let settings = {
            let config = self.config.read();
            LoopSettings {
                mode: config.receive_mode,
                silence_threshold: config.silence_threshold,
            }
        };
        self.receiver
            .start(link, handle.name(), handle.shared(), settings, sink)
    }

    /// Stop the receive session and wait for its worker to exit.
    ///
    /// No sink call happens after this returns. No-op when idle.
    pub fn end_receiving(&self) -> LinkResult<()> {
        self.receiver.end()
    }

    pub fn receive_state(&self) -> ReceiveState {
        self.receiver.state()
    }

    /// Read fault that ended the last receive session, if any.
    pub fn take_fault(&self) -> Option<LinkError> {
        self.receiver.take_fault()
    }
}

impl Drop for PortRegistry {
    fn drop(&mut self) {
        if let Err(e) = self.close_all() {
            warn!("Error while tearing down port registry: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MockPortOpener, MockSerialPort};

    fn registry_with(names: &[&str]) -> (PortRegistry, Vec<MockSerialPort>) {
        let opener = MockPortOpener::new();
        let mocks: Vec<_> = names
            .iter()
            .map(|n| {
                let m = MockSerialPort::new(*n);
                opener.register(&m);
                m
            })
            .collect();
        (
            PortRegistry::with_opener(SessionConfig::default(), opener),
            mocks,
        )
    }

    #[test]
    fn test_create_port_unknown_device() {
        let (registry, _) = registry_with(&[]);
        let err = registry.create_port("COM42").unwrap_err();
        assert!(matches!(err, LinkError::PortUnavailable { ref port, .. } if port == "COM42"));
    }

    #[test]
    fn test_alias_resolution() {
        let (registry, mocks) = registry_with(&["/dev/ttyUSB0"]);
        let registry = registry.with_aliases(HashMap::from([(
            "arduino".to_string(),
            "/dev/ttyUSB0".to_string(),
        )]));

        let handle = registry.create_port("arduino").unwrap();
        assert_eq!(handle.name(), "/dev/ttyUSB0");
        assert!(handle.is_open());
        assert_eq!(mocks[0].close_count(), 0);
    }

    #[test]
    fn test_describe_empty_registry() {
        let (registry, _) = registry_with(&[]);
        let report = registry.describe();
        assert_eq!(report.slots.len(), 4);
        assert!(report.slots.iter().all(|s| s.port.is_none()));
        assert_eq!(report.baud_rate, 9600);
        assert_eq!(report.receive, ReceiveState::Idle);
        assert!(report.to_string().contains("| Link1.Tx | not set"));
    }

    #[test]
    fn test_terminator_toggle() {
        let (registry, mocks) = registry_with(&["DEV-A"]);
        registry.open_slot("DEV-A", Slot::Link1Tx).unwrap();

        registry.set_append_terminator(true);
        assert_eq!(registry.send(Link::One, b"ok").unwrap(), 2);
        assert_eq!(mocks[0].get_write_log(), vec![b"ok\0".to_vec()]);
    }
}

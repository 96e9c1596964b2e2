//! Receive engine.
//!
//! At most one receive session runs per registry. A session owns a named
//! worker thread that reads the bound handle one byte at a time and feeds a
//! [`PortionTracker`]; stopping sets a flag and joins the worker, so once
//! [`ReceiveEngine::end`] returns no sink call can still be in flight.
//!
//! The join has no timeout. Reads are bounded by the handle's read timeout; a
//! driver that ignores its timeout will hang `end`.

mod portion;
mod sink;

pub use portion::PortionTracker;
pub use sink::{sink_fn, FnSink, ReceiveEvent, ReceiveSink};

use crate::error::{LinkError, LinkResult};
use crate::registry::SharedPort;
use crate::slot::{Link, Slot};
use crate::state::ReceiveMode;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Observable engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "link", rename_all = "snake_case")]
pub enum ReceiveState {
    Idle,
    Running(Link),
}

/// Segmentation settings captured when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    pub mode: ReceiveMode,
    pub silence_threshold: u32,
}

struct ActiveSession {
    link: Link,
    slot: Slot,
    stop: Arc<AtomicBool>,
    /// Cleared by the worker when it exits for any reason.
    running: Arc<AtomicBool>,
    worker: JoinHandle<()>,
}

impl ActiveSession {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn stop_and_join(self) -> LinkResult<()> {
        self.stop.store(true, Ordering::Release);
        self.worker.join().map_err(|_| LinkError::WorkerPanicked)
    }
}

/// Owner of the single receive worker.
#[derive(Default)]
pub struct ReceiveEngine {
    session: Mutex<Option<ActiveSession>>,
    fault: Arc<Mutex<Option<LinkError>>>,
}

impl ReceiveEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a worker reading `port` and return without waiting for data.
    ///
    /// # Errors
    ///
    /// - `LinkError::ReceiveActive` if a session is still running
    /// - `LinkError::Spawn` if the worker thread could not be created
    pub fn start<S: ReceiveSink>(
        &self,
        link: Link,
        port_name: &str,
        port: SharedPort,
        settings: LoopSettings,
        sink: S,
    ) -> LinkResult<()> {
        let mut session = self.session.lock();

        if let Some(active) = session.take() {
            let active_link = active.link;
            if active.is_running() {
                *session = Some(active);
                return Err(LinkError::ReceiveActive(active_link));
            }
            // The previous worker already stopped on its own; reap it. A panic
            // there belongs to the dead session, not to this start.
            if let Err(e) = active.stop_and_join() {
                warn!("Reaped receive worker for link {}: {}", active_link, e);
            }
        }

        let stop = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));
        let worker = Worker {
            port,
            port_name: port_name.to_string(),
            tracker: PortionTracker::new(settings.mode, settings.silence_threshold),
            sink,
            stop: Arc::clone(&stop),
            running: Arc::clone(&running),
            fault: Arc::clone(&self.fault),
        };

        let handle = thread::Builder::new()
            .name(format!("rx-link{}", link.number()))
            .spawn(move || worker.run())
            .map_err(LinkError::Spawn)?;

        info!(
            "Receive session started on link {} ({}, {:?} mode)",
            link, port_name, settings.mode
        );
        *session = Some(ActiveSession {
            link,
            slot: link.rx_slot(),
            stop,
            running,
            worker: handle,
        });
        Ok(())
    }

    /// Stop the session and wait for the worker to exit. No-op when idle.
    ///
    /// # Errors
    ///
    /// - `LinkError::WorkerPanicked` if the sink panicked on the worker thread
    pub fn end(&self) -> LinkResult<()> {
        let mut session = self.session.lock();
        match session.take() {
            Some(active) => {
                let link = active.link;
                active.stop_and_join()?;
                info!("Receive session on link {} ended", link);
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn state(&self) -> ReceiveState {
        match &*self.session.lock() {
            Some(active) if active.is_running() => ReceiveState::Running(active.link),
            _ => ReceiveState::Idle,
        }
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        matches!(self.state(), ReceiveState::Running(_))
    }

    /// Slot the running worker reads from, if any.
    pub fn bound_slot(&self) -> Option<Slot> {
        self.session
            .lock()
            .as_ref()
            .filter(|active| active.is_running())
            .map(|active| active.slot)
    }

    /// Take the read fault that ended the last session, if any.
    pub fn take_fault(&self) -> Option<LinkError> {
        self.fault.lock().take()
    }
}

impl Drop for ReceiveEngine {
    fn drop(&mut self) {
        let _ = self.end();
    }
}

struct Worker<S> {
    port: SharedPort,
    port_name: String,
    tracker: PortionTracker,
    sink: S,
    stop: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    fault: Arc<Mutex<Option<LinkError>>>,
}

/// Clears the running flag however the worker exits, panics included.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: ReceiveSink> Worker<S> {
    fn run(mut self) {
        let _guard = RunningGuard(Arc::clone(&self.running));

        while !self.stop.load(Ordering::Acquire) {
            // Hold the handle only for one read so parameter changes and
            // reports can get in between bytes.
            let result = {
                let mut port = self.port.lock();
                if !port.is_open() {
                    info!("{} closed, receive loop exiting", self.port_name);
                    break;
                }
                port.read_byte()
            };

            if self.stop.load(Ordering::Acquire) {
                break;
            }

            match result {
                Ok(Some(byte)) => {
                    let event = self.tracker.on_byte(byte);
                    self.sink.deliver(event);
                }
                Ok(None) => {
                    if let Some(event) = self.tracker.on_silence() {
                        if let ReceiveEvent::PortionEnd { portion } = &event {
                            debug!(
                                "Portion of {} bytes ended on {}",
                                portion.len(),
                                self.port_name
                            );
                        }
                        self.sink.deliver(event);
                    }
                }
                Err(e) => {
                    error!("Read from {} failed, stopping receive: {}", self.port_name, e);
                    self.sink.deliver(ReceiveEvent::Fault {
                        port: self.port_name.clone(),
                        message: e.to_string(),
                    });
                    *self.fault.lock() = Some(LinkError::ReadFault {
                        port: self.port_name.clone(),
                        source: e,
                    });
                    break;
                }
            }
        }
    }
}

//! Shared test utilities for serial-links tests.
//!
//! This module provides common test infrastructure including:
//! - Registries backed by mock ports
//! - A loopback pair wired transmit-to-receive
//! - Helpers for draining receive events with a deadline

#![allow(dead_code)]

use serial_links::port::{MockPortOpener, MockSerialPort};
use serial_links::{PortRegistry, ReceiveEvent, SessionConfig};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Read timeout used by mock-backed registries. Short, so a portion ends
/// within a few tens of milliseconds of silence.
pub const TEST_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Upper bound for waiting on any receive event in a test.
pub const EVENT_DEADLINE: Duration = Duration::from_secs(3);

pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        timeout: TEST_READ_TIMEOUT,
        ..SessionConfig::default()
    }
}

/// Registry whose opener knows one mock per name in `names`.
///
/// The returned mocks share state with the ones the registry opens, so they
/// can be used to inspect writes and close counts.
pub fn mock_registry(names: &[&str]) -> (PortRegistry, Vec<MockSerialPort>) {
    let opener = MockPortOpener::new();
    let mocks = names
        .iter()
        .map(|name| {
            let mock = MockSerialPort::new(*name);
            opener.register(&mock);
            mock
        })
        .collect();
    (
        PortRegistry::with_opener(test_session_config(), opener),
        mocks,
    )
}

/// Loopback bench: everything written to `DEV-A` arrives on `DEV-B`.
pub struct LoopbackBench {
    pub registry: PortRegistry,
    pub tx: MockSerialPort,
    pub rx: MockSerialPort,
}

pub fn loopback_bench() -> LoopbackBench {
    let (registry, mut mocks) = mock_registry(&["DEV-A", "DEV-B"]);
    let rx = mocks.pop().unwrap();
    let tx = mocks.pop().unwrap();
    tx.loopback_into(&rx);
    LoopbackBench { registry, tx, rx }
}

/// Collect events until a `PortionEnd` arrives, returning everything seen.
///
/// Panics if the deadline passes first.
pub fn collect_portion(events: &Receiver<ReceiveEvent>) -> Vec<ReceiveEvent> {
    let deadline = Instant::now() + EVENT_DEADLINE;
    let mut seen = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(event) => {
                let done = matches!(event, ReceiveEvent::PortionEnd { .. });
                seen.push(event);
                if done {
                    return seen;
                }
            }
            Err(RecvTimeoutError::Timeout) => panic!("no portion end within deadline, got {seen:?}"),
            Err(RecvTimeoutError::Disconnected) => panic!("session ended early, got {seen:?}"),
        }
    }
}

/// Collect `n` events, panicking if they do not arrive in time.
pub fn collect_n(events: &Receiver<ReceiveEvent>, n: usize) -> Vec<ReceiveEvent> {
    (0..n)
        .map(|i| {
            events
                .recv_timeout(EVENT_DEADLINE)
                .unwrap_or_else(|e| panic!("event {i} of {n} missing: {e}"))
        })
        .collect()
}

/// Drain whatever is buffered and report whether the sender was dropped.
pub fn drain(events: &Receiver<ReceiveEvent>) -> (Vec<ReceiveEvent>, bool) {
    let mut seen = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => seen.push(event),
            Err(std::sync::mpsc::TryRecvError::Empty) => return (seen, false),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => return (seen, true),
        }
    }
}

/// Wait until `condition` holds or the deadline passes.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + EVENT_DEADLINE;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Data events for `payload` as delivered in portion mode.
pub fn portion_data_events(payload: &[u8]) -> Vec<ReceiveEvent> {
    payload
        .iter()
        .enumerate()
        .map(|(i, &b)| ReceiveEvent::Data {
            chunk: vec![b],
            count: i + 1,
        })
        .collect()
}

//! Utility functions for hardware testing.
//!
//! Provides helpers for reading the test wiring from the environment and
//! printing what the host can see.

use serial_links::{list_port_details, PortKind};
use std::env;
use std::time::Duration;

/// Test wiring from environment.
///
/// `TEST_TX_PORT` must be connected (null-modem cable or jumper) to
/// `TEST_RX_PORT`; both may name the same device if it has TX looped to RX.
pub struct TestWiring {
    pub tx_port: String,
    pub rx_port: String,
    pub baud_rate: u32,
}

impl TestWiring {
    /// Get test wiring from environment variables.
    pub fn from_env() -> Option<Self> {
        let tx_port = env::var("TEST_TX_PORT").ok()?;
        let rx_port = env::var("TEST_RX_PORT").ok()?;
        let baud_rate = env::var("TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(9600);

        Some(TestWiring {
            tx_port,
            rx_port,
            baud_rate,
        })
    }

    /// Read timeout short enough that a portion ends quickly.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(50)
    }
}

/// Skip test if hardware is not available.
pub fn skip_without_wiring() -> Option<TestWiring> {
    let wiring = TestWiring::from_env();
    if wiring.is_none() {
        println!("Skipping hardware test: TEST_TX_PORT / TEST_RX_PORT not set");
    }
    wiring
}

/// Print available ports for debugging.
pub fn print_available_ports() {
    let ports = list_port_details();

    if ports.is_empty() {
        println!("No serial ports detected on this system");
        return;
    }

    println!("Available serial ports ({}):", ports.len());
    for (idx, port) in ports.iter().enumerate() {
        println!("  {}. {}", idx + 1, port.name);
        if let PortKind::Usb { vid, pid, product, .. } = &port.kind {
            println!("     VID:PID = {:04x}:{:04x}", vid, pid);
            if let Some(product) = product {
                println!("     Product: {}", product);
            }
        }
    }
}

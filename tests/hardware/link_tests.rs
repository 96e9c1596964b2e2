//! Send and receive over real, physically wired ports.

use super::utils::skip_without_wiring;
use crate::common::collect_portion;
use serial_links::{Link, LinkError, PortRegistry, ReceiveEvent, SessionConfig, Slot};
use std::sync::mpsc;

fn wired_registry() -> Option<PortRegistry> {
    let wiring = skip_without_wiring()?;
    let registry = PortRegistry::new(SessionConfig {
        baud_rate: wiring.baud_rate,
        timeout: wiring.read_timeout(),
        ..SessionConfig::default()
    });

    registry
        .open_slot(&wiring.tx_port, Slot::Link1Tx)
        .expect("open transmit port");
    if wiring.rx_port != wiring.tx_port {
        registry
            .open_slot(&wiring.rx_port, Slot::Link1Rx)
            .expect("open receive port");
    }
    Some(registry)
}

#[test]
#[ignore]
fn test_hello_loopback() {
    let Some(registry) = wired_registry() else {
        return;
    };
    if registry.describe().slot(Slot::Link1Rx).and_then(|s| s.port.clone()).is_none() {
        println!("Skipping: single-device loopback needs distinct TX and RX ports");
        return;
    }

    let (tx, events) = mpsc::channel();
    registry.start_receiving(Link::One, tx).unwrap();
    assert_eq!(registry.send(Link::One, b"hello").unwrap(), 5);

    let seen = collect_portion(&events);
    assert_eq!(
        seen.last(),
        Some(&ReceiveEvent::PortionEnd {
            portion: b"hello".to_vec()
        })
    );
    registry.close_all().unwrap();
}

#[test]
#[ignore]
fn test_reopen_after_close_all() {
    let Some(wiring) = skip_without_wiring() else {
        return;
    };
    let registry = PortRegistry::new(SessionConfig::default());

    registry.open_slot(&wiring.tx_port, Slot::Link1Tx).unwrap();
    registry.close_all().unwrap();
    // The OS handle was released, so the device can be opened again.
    registry.open_slot(&wiring.tx_port, Slot::Link1Tx).unwrap();
    registry.close_all().unwrap();
}

#[test]
#[ignore]
fn test_missing_device_is_unavailable() {
    let registry = PortRegistry::new(SessionConfig::default());
    assert!(matches!(
        registry.create_port("/dev/serial-links-does-not-exist"),
        Err(LinkError::PortUnavailable { .. })
    ));
}

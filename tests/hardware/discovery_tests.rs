//! Discovery against the host's real enumeration API.

use super::utils::{print_available_ports, skip_without_wiring};
use serial_links::{list_available_ports, list_port_details};

#[test]
#[ignore]
fn test_names_and_details_agree() {
    print_available_ports();

    let names = list_available_ports();
    let details: Vec<_> = list_port_details().into_iter().map(|p| p.name).collect();
    assert_eq!(names, details);
}

#[test]
#[ignore]
fn test_wired_ports_are_listed() {
    let Some(wiring) = skip_without_wiring() else {
        return;
    };

    let names = list_available_ports();
    assert!(names.contains(&wiring.tx_port), "{} not in {:?}", wiring.tx_port, names);
    assert!(names.contains(&wiring.rx_port), "{} not in {:?}", wiring.rx_port, names);
}

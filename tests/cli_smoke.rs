//! Smoke tests for the `serial-links` binary.
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_serial-links"))
        .args(args)
        // Keep a developer's config file out of the picture.
        .env("SERIAL_LINKS_CONFIG", "/nonexistent/serial-links.toml")
        .env("XDG_CONFIG_HOME", "/nonexistent")
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to start binary")
}

#[test]
fn describe_prints_empty_slot_table() {
    let output = run(&["describe"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for label in ["Link1.Tx", "Link1.Rx", "Link2.Rx", "Link2.Tx"] {
        assert!(stdout.contains(&format!("| {label} | not set")), "missing {label}: {stdout}");
    }
    assert!(stdout.contains("| baudrate | 9600"));
}

#[test]
fn describe_json_honours_global_parameters() {
    let output = run(&["--baud", "115200", "--timeout", "0.25", "describe", "--json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["baud_rate"], 115200);
    assert_eq!(report["timeout_secs"], 0.25);
    assert_eq!(report["slots"].as_array().unwrap().len(), 4);
}

#[test]
fn ports_json_is_a_list() {
    let output = run(&["ports", "--json"]);
    assert!(output.status.success());

    let ports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(ports.is_array());
}

#[test]
fn send_to_missing_device_fails() {
    let output = run(&["send", "--tx", "/dev/serial-links-missing", "hello"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("PortUnavailable"));
}

#[test]
fn invalid_link_is_rejected_by_parser() {
    let output = run(&["send", "--link", "3", "--tx", "COM1", "x"]);
    assert!(!output.status.success());
}

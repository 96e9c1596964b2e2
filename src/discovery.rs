//! Serial device enumeration.
//!
//! Enumeration failures never surface to the caller: a machine whose
//! enumeration API errors out is treated as having no ports.

use serde::Serialize;
use serialport::{SerialPortInfo, SerialPortType};
use tracing::warn;

/// Names of the serial devices currently visible to the OS, in enumeration order.
pub fn list_available_ports() -> Vec<String> {
    enumerate().into_iter().map(|p| p.port_name).collect()
}

/// Kind of bus a serial device hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortKind {
    Usb {
        vid: u16,
        pid: u16,
        manufacturer: Option<String>,
        product: Option<String>,
        serial_number: Option<String>,
    },
    Pci,
    Bluetooth,
    Unknown,
}

/// A discovered device with its bus details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub kind: PortKind,
}

impl From<SerialPortInfo> for PortDescriptor {
    fn from(info: SerialPortInfo) -> Self {
        let kind = match info.port_type {
            SerialPortType::UsbPort(usb) => PortKind::Usb {
                vid: usb.vid,
                pid: usb.pid,
                manufacturer: usb.manufacturer,
                product: usb.product,
                serial_number: usb.serial_number,
            },
            SerialPortType::PciPort => PortKind::Pci,
            SerialPortType::BluetoothPort => PortKind::Bluetooth,
            SerialPortType::Unknown => PortKind::Unknown,
        };
        Self {
            name: info.port_name,
            kind,
        }
    }
}

/// Discovered devices with bus details, in enumeration order.
pub fn list_port_details() -> Vec<PortDescriptor> {
    enumerate().into_iter().map(PortDescriptor::from).collect()
}

fn enumerate() -> Vec<SerialPortInfo> {
    match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!("Serial port enumeration failed, reporting none: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    #[test]
    fn test_listing_never_panics() {
        let names = list_available_ports();
        let details = list_port_details();
        assert_eq!(names.len(), details.len());
    }

    #[test]
    fn test_usb_descriptor_conversion() {
        let info = SerialPortInfo {
            port_name: "/dev/ttyUSB0".into(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x0403,
                pid: 0x6001,
                serial_number: Some("A1".into()),
                manufacturer: Some("FTDI".into()),
                product: None,
            }),
        };

        let descriptor = PortDescriptor::from(info);
        assert_eq!(descriptor.name, "/dev/ttyUSB0");
        assert!(matches!(
            descriptor.kind,
            PortKind::Usb { vid: 0x0403, pid: 0x6001, .. }
        ));

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["kind"], "usb");
        assert_eq!(json["manufacturer"], "FTDI");
    }
}

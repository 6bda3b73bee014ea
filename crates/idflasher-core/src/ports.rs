//! Serial port discovery
//!
//! Ports are listed from the operating system on every call and never cached.
//! Each port carries a free-text description, which is matched against a few
//! well-known USB-UART bridge names to guess which port the device sits on.
//! The guess only drives the suggested default; any port may still be chosen
//! explicitly.

use crate::error::Result;
use serialport::SerialPortType;

/// Placeholder shown in front of the real ports when nothing is selected yet
pub const NO_SELECTION: &str = "--- Select Port ---";

/// Description used when the OS gives nothing better
const UNKNOWN_DESCRIPTION: &str = "n/a";

/// Case-sensitive description fragments of common USB-serial bridges
///
/// CP210x (Silicon Labs) and CH340 (WCH) cover most ESP32 dev boards;
/// "USB Serial" catches the generic FTDI/CDC naming.
pub const TARGET_BRIDGE_MARKERS: &[&str] = &["CP210", "CH340", "USB Serial"];

/// A serial port as reported by the OS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    /// Device name (`/dev/ttyUSB0`, `COM5`, ...)
    pub name: String,
    /// Human-readable description of the attached adapter
    pub description: String,
}

impl Port {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Whether this port looks like a USB-UART bridge of a target board
    pub fn is_likely_target(&self) -> bool {
        is_likely_target(&self.description)
    }
}

/// Check a port description against [`TARGET_BRIDGE_MARKERS`]
pub fn is_likely_target(description: &str) -> bool {
    TARGET_BRIDGE_MARKERS
        .iter()
        .any(|marker| description.contains(marker))
}

/// Pick the port to pre-select, if the choice is unambiguous
///
/// Returns the only likely target. With no candidates, or more than one,
/// nothing is suggested and the operator has to choose.
pub fn suggest_port(ports: &[Port]) -> Option<&Port> {
    let mut candidates = ports.iter().filter(|p| p.is_likely_target());
    match (candidates.next(), candidates.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// Whether a selection string names an actual port
pub fn is_port_selected(port: &str) -> bool {
    let port = port.trim();
    !port.is_empty() && port != NO_SELECTION
}

/// List the serial ports currently known to the OS
///
/// An empty list is a normal result when nothing is plugged in.
pub fn list_ports() -> Result<Vec<Port>> {
    let ports = serialport::available_ports()?;
    log::debug!("OS reported {} serial port(s)", ports.len());

    Ok(ports
        .into_iter()
        .map(|info| Port {
            description: describe(&info.port_type),
            name: info.port_name,
        })
        .collect())
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => describe_usb(
            usb.product.as_deref(),
            usb.manufacturer.as_deref(),
            usb.vid,
            usb.pid,
        ),
        SerialPortType::PciPort => "PCI serial port".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth serial port".to_string(),
        SerialPortType::Unknown => UNKNOWN_DESCRIPTION.to_string(),
    }
}

/// Product string first, then manufacturer, then the raw USB ids
fn describe_usb(product: Option<&str>, manufacturer: Option<&str>, vid: u16, pid: u16) -> String {
    product
        .filter(|s| !s.is_empty())
        .or(manufacturer.filter(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("USB {:04x}:{:04x}", vid, pid))
}

use log::{info, warn};
pub use tokio_serial::{SerialPortInfo, SerialPortType, UsbPortInfo, available_ports};

use crate::platform::Platform;

/// Substrings of a port description that mark a USB-serial adapter.
const DESCRIPTION_HINTS: &[&str] = &["USB", "Serial"];

/// Substrings of a device path that mark a USB-serial adapter.
const PATH_HINTS: &[&str] = &["usbserial", "usbmodem"];

/// Currently attached serial ports. Enumeration failure yields an empty list.
pub fn list_ports() -> Vec<SerialPortInfo> {
    match available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!("Error listing ports: {}", e);
            Vec::new()
        }
    }
}

/// Human readable description of a port, derived from its type.
pub fn describe_port(port: &SerialPortInfo) -> String {
    match &port.port_type {
        SerialPortType::UsbPort(info) => {
            let parts: Vec<&str> = [info.manufacturer.as_deref(), info.product.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if parts.is_empty() {
                String::from("USB Serial Device")
            } else {
                parts.join(" ")
            }
        }
        SerialPortType::PciPort => String::from("PCI"),
        SerialPortType::BluetoothPort => String::from("Bluetooth"),
        SerialPortType::Unknown => String::from("n/a"),
    }
}

/// Whether a port looks like the sensing device.
pub fn is_device_candidate(port: &SerialPortInfo) -> bool {
    let description = describe_port(port);
    DESCRIPTION_HINTS.iter().any(|hint| description.contains(hint))
        || PATH_HINTS.iter().any(|hint| port.port_name.contains(hint))
}

/// Pick the port to connect to: the first plausible device, otherwise the
/// platform default. The returned path is not checked for existence.
pub fn resolve_port(ports: &[SerialPortInfo], platform: Platform) -> String {
    match ports.iter().find(|p| is_device_candidate(p)) {
        Some(port) => {
            info!("Auto-detected serial port: {}", port.port_name);
            port.port_name.clone()
        }
        None => platform.default_port().to_string(),
    }
}

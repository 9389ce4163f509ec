//! Serial port discovery.

pub mod ports;

pub use ports::{describe_port, is_device_candidate, list_ports, resolve_port};

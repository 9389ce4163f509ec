//! Runtime configuration for the bridge.
//!
//! There is no configuration file; the defaults below are what the binary
//! runs with. Tests shorten the delays.

use std::time::Duration;

/// Serial baud rate the device firmware talks at.
pub const BAUD_RATE: u32 = 115_200;

/// Bridge configuration.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Serial port path. `None` means auto-detect.
    pub port: Option<String>,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Wait after a lost connection or failed open before reconnecting.
    pub reconnect_delay: Duration,
    /// Wait after an unexpected, non-transport error.
    pub transient_delay: Duration,
    /// Size of a single read from the serial stream.
    pub read_buffer_size: usize,
    /// How long a stopping reader may take before it is aborted.
    pub stop_grace: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: BAUD_RATE,
            reconnect_delay: Duration::from_secs(2),
            transient_delay: Duration::from_secs(1),
            read_buffer_size: 1024,
            stop_grace: Duration::from_millis(500),
        }
    }
}

impl BridgeConfig {
    /// Use a fixed port path instead of auto-detection.
    #[must_use]
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Override both reconnect backoffs.
    #[must_use]
    pub fn with_delays(mut self, reconnect: Duration, transient: Duration) -> Self {
        self.reconnect_delay = reconnect;
        self.transient_delay = transient;
        self
    }
}

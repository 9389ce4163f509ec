use std::fmt;

/// Host operating system family, fixed at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
}

impl Platform {
    /// Platform this binary was built for. Anything that is neither macOS nor
    /// Windows is driven like Linux.
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Serial port used when no attached device looks like the sensor.
    pub const fn default_port(self) -> &'static str {
        match self {
            Platform::MacOs => "/dev/tty.usbserial-0001",
            Platform::Linux => "/dev/ttyUSB0",
            Platform::Windows => "COM3",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacOs => write!(f, "macOS"),
            Platform::Linux => write!(f, "Linux"),
            Platform::Windows => write!(f, "Windows"),
        }
    }
}

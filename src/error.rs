//! # Error Module
//!
//! This module provides custom error types for the `serial_media` bridge.
//! It uses the `thiserror` crate for ergonomic error handling.

use thiserror::Error;

/// Result type alias for `serial_media` operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Main error type for the `serial_media` bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Failed to open serial port.
    #[error("Failed to open serial port '{port_name}': {reason}")]
    PortOpen { port_name: String, reason: String },

    /// Failed to read from serial port.
    #[error("Failed to read from serial port: {0}")]
    PortRead(String),

    /// Failed to write to serial port.
    #[error("Failed to write to serial port: {0}")]
    PortWrite(String),

    /// The device closed the connection.
    #[error("Serial connection closed by device")]
    Disconnected,

    /// I/O error on the serial stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The volume argument of `VOL_SET` is not an integer.
    #[error("Invalid volume level")]
    InvalidVolume(String),

    /// An external program exited unsuccessfully or could not be started.
    #[error("{program} failed: {reason}")]
    CommandFailed { program: String, reason: String },

    /// No mechanism is available on this host for the requested action.
    #[error("{0}")]
    ToolUnavailable(String),

    /// A native platform API call failed.
    #[error("Platform backend error: {0}")]
    Backend(String),

    /// Anything the supervisor does not know how to classify.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl BridgeError {
    /// Creates a new port open error.
    #[must_use]
    pub fn port_open(port_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PortOpen {
            port_name: port_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new external command error.
    #[must_use]
    pub fn command_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommandFailed {
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new tool unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ToolUnavailable(msg.into())
    }

    /// Creates a new backend error.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Creates a new unexpected error.
    #[must_use]
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Whether the error means the serial connection is gone and must be
    /// reopened.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::PortOpen { .. }
                | Self::PortRead(_)
                | Self::PortWrite(_)
                | Self::Disconnected
                | Self::Io(_)
        )
    }
}

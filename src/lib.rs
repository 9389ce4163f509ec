//! # Serial Media
//!
//! Bridges a gesture-sensing device on a serial port to the host's media and
//! volume controls.
//!
//! The device sends newline-terminated commands (`PLAY_PAUSE`, `NEXT`,
//! `VOL_SET:40`, ...). Each one is run against the platform backend and
//! answered with `OK`, `ERR: <message>` or `IGNORED: Unknown command <cmd>`.
//!
//! ## Architecture
//!
//! - [`port`]: serial port discovery
//! - [`serial`]: line framing, the reader task and the reconnecting supervisor
//! - [`command`]: command parsing and dispatch
//! - [`backend`]: macOS, Linux and Windows media/volume backends
//! - [`error`]: custom error types for the application

pub mod backend;
pub mod banner;
pub mod command;
pub mod config;
pub mod error;
pub mod platform;
pub mod port;
pub mod serial;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::backend::{MediaBackend, select_backend};
    pub use crate::command::{Command, Dispatcher, Response};
    pub use crate::config::BridgeConfig;
    pub use crate::error::*;
    pub use crate::platform::Platform;
    pub use crate::serial::{ConnectionState, Connector, SerialConnector, Supervisor};
}

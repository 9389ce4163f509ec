//! # Backend Module
//!
//! Platform implementations of the playback and volume primitives the device
//! can trigger. One backend is chosen at startup from the compile target and
//! used for the lifetime of the process.
//!
//! - [`linux`]: `playerctl`/`dbus-send` for media, `pactl`/`amixer` for volume
//! - [`macos`]: native media keys with an AppleScript fallback
//! - [`windows`]: Core Audio endpoint volume and simulated key presses

pub mod endpoint;
pub mod keys;
pub mod linux;
pub mod macos;
pub mod windows;

use std::process::{Command, Stdio};
use std::sync::Arc;

use log::debug;

use crate::error::{BridgeError, Result};
use crate::platform::Platform;

pub use endpoint::{AudioEndpoint, default_endpoint};
pub use keys::{MediaKey, MediaKeys, native_keys};
pub use linux::{LinuxBackend, Tools};
pub use macos::MacosBackend;
pub use windows::WindowsBackend;

/// Playback and volume primitives of one platform.
#[cfg_attr(test, mockall::automock)]
pub trait MediaBackend: Send + Sync {
    /// Short name shown in the startup banner.
    fn name(&self) -> &'static str;

    /// Banner lines describing which mechanisms are available.
    fn capabilities(&self) -> Vec<String>;

    fn play_pause(&self) -> Result<()>;

    fn next(&self) -> Result<()>;

    fn previous(&self) -> Result<()>;

    fn volume_up(&self) -> Result<()>;

    fn volume_down(&self) -> Result<()>;

    /// Set the output volume. `percent` is already clamped to 0..=100.
    fn volume_set(&self, percent: u8) -> Result<()>;

    fn mute_toggle(&self) -> Result<()>;
}

/// Volume operations shared by the command-line driven backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum VolumeChange {
    Up,
    Down,
    Set(u8),
    ToggleMute,
}

/// Runs an external program to completion.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<()>;
}

/// Spawns real processes with their output discarded. A non-zero exit status
/// is an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        debug!("Running {} {:?}", program, args);
        let status = Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| BridgeError::command_failed(program, e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(BridgeError::command_failed(program, status.to_string()))
        }
    }
}

/// Build the backend for `platform` with its real collaborators.
pub fn select_backend(platform: Platform) -> Arc<dyn MediaBackend> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    match platform {
        Platform::MacOs => Arc::new(MacosBackend::new(runner, native_keys())),
        Platform::Linux => Arc::new(LinuxBackend::new(runner, Tools::detect())),
        Platform::Windows => Arc::new(WindowsBackend::new(default_endpoint(), native_keys())),
    }
}

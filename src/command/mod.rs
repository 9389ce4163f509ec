//! # Command Module
//!
//! Parses the device's text commands and runs them against a
//! [`MediaBackend`], producing the acknowledgement line sent back over the
//! serial link.
//!
//! ## Grammar
//!
//! | Command        | Action                               |
//! |----------------|--------------------------------------|
//! | `PLAY_PAUSE`   | toggle playback                      |
//! | `NEXT`         | next track                           |
//! | `PREV`         | previous track                       |
//! | `VOL_UP`       | raise volume one step                |
//! | `VOL_DOWN`     | lower volume one step                |
//! | `VOL_SET:<n>`  | set volume to `n`, clamped to 0..=100 |
//! | `VOL_MUTE`     | toggle mute                          |
//!
//! Matching is case-insensitive. Anything else is acknowledged as ignored.

use std::fmt;
use std::num::IntErrorKind;
use std::sync::Arc;

use log::error;

use crate::backend::MediaBackend;
use crate::error::{BridgeError, Result};

/// Lines shorter than this are treated as line noise and never answered.
pub const MIN_COMMAND_LEN: usize = 2;

const VOL_SET_PREFIX: &str = "VOL_SET:";

/// A parsed device command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    PlayPause,
    Next,
    Prev,
    VolumeUp,
    VolumeDown,
    VolumeSet(u8),
    VolumeMute,
    /// Unrecognized, carrying the normalized text.
    Unknown(String),
}

impl Command {
    /// Parse an already normalized (trimmed, upper-case) command.
    pub fn parse(normalized: &str) -> Result<Self> {
        let command = match normalized {
            "PLAY_PAUSE" => Command::PlayPause,
            "NEXT" => Command::Next,
            "PREV" => Command::Prev,
            "VOL_UP" => Command::VolumeUp,
            "VOL_DOWN" => Command::VolumeDown,
            "VOL_MUTE" => Command::VolumeMute,
            other => match other.strip_prefix(VOL_SET_PREFIX) {
                Some(arg) => Command::VolumeSet(parse_volume(arg)?),
                None => Command::Unknown(other.to_string()),
            },
        };
        Ok(command)
    }
}

/// Parse the `VOL_SET` argument: the text up to the next `:`, as a signed
/// integer clamped to 0..=100.
fn parse_volume(arg: &str) -> Result<u8> {
    let value = arg.split(':').next().unwrap_or_default().trim();
    let level = match value.parse::<i64>() {
        Ok(level) => level,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => return Err(BridgeError::InvalidVolume(value.to_string())),
        },
    };
    Ok(level.clamp(0, 100) as u8)
}

/// Trim and upper-case a received line.
pub fn normalize(line: &str) -> String {
    line.trim().to_uppercase()
}

/// Acknowledgement sent back to the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Ok,
    Err(String),
    Ignored(String),
}

impl Response {
    /// Wire form, newline terminated.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => write!(f, "OK"),
            Response::Err(msg) => write!(f, "ERR: {msg}"),
            Response::Ignored(command) => write!(f, "IGNORED: Unknown command {command}"),
        }
    }
}

/// Maps command lines to backend calls.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn MediaBackend>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self { backend }
    }

    /// Run one received line. Returns `None` for noise shorter than
    /// [`MIN_COMMAND_LEN`], which gets no acknowledgement.
    pub fn execute(&self, line: &str) -> Option<Response> {
        let trimmed = line.trim();
        if trimmed.chars().count() < MIN_COMMAND_LEN {
            return None;
        }

        let normalized = normalize(trimmed);
        let response = match Command::parse(&normalized) {
            Ok(Command::Unknown(command)) => Response::Ignored(command),
            Ok(command) => match self.run(&command) {
                Ok(()) => Response::Ok,
                Err(e) => {
                    error!("{} failed: {}", normalized, e);
                    Response::Err(e.to_string())
                }
            },
            Err(e) => Response::Err(e.to_string()),
        };
        Some(response)
    }

    fn run(&self, command: &Command) -> Result<()> {
        match command {
            Command::PlayPause => self.backend.play_pause(),
            Command::Next => self.backend.next(),
            Command::Prev => self.backend.previous(),
            Command::VolumeUp => self.backend.volume_up(),
            Command::VolumeDown => self.backend.volume_down(),
            Command::VolumeSet(percent) => self.backend.volume_set(*percent),
            Command::VolumeMute => self.backend.mute_toggle(),
            Command::Unknown(_) => Ok(()),
        }
    }
}

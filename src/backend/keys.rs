//! Simulated media key presses.

use crate::error::Result;

/// Keys the backends may inject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKey {
    PlayPause,
    Next,
    Previous,
    VolumeUp,
    VolumeDown,
}

/// Injects a media key press (down and up) into the OS input stream.
pub trait MediaKeys: Send + Sync {
    fn press(&self, key: MediaKey) -> Result<()>;
}

/// Native key injection for the current platform, if it has one.
pub fn native_keys() -> Option<Box<dyn MediaKeys>> {
    #[cfg(any(target_os = "macos", target_os = "windows"))]
    {
        Some(Box::new(enigo_keys::EnigoKeys))
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        None
    }
}

#[cfg(any(target_os = "macos", target_os = "windows"))]
mod enigo_keys {
    use enigo::{Direction, Enigo, Key, Keyboard, Settings};

    use super::{MediaKey, MediaKeys};
    use crate::error::{BridgeError, Result};

    /// Posts system-defined media key events on macOS and virtual media keys
    /// on Windows.
    pub struct EnigoKeys;

    impl MediaKeys for EnigoKeys {
        fn press(&self, key: MediaKey) -> Result<()> {
            // Enigo is not Send on macOS, so a connection is made per press.
            let mut enigo = Enigo::new(&Settings::default())
                .map_err(|e| BridgeError::backend(format!("key injection unavailable: {e}")))?;
            let key = match key {
                MediaKey::PlayPause => Key::MediaPlayPause,
                MediaKey::Next => Key::MediaNextTrack,
                MediaKey::Previous => Key::MediaPrevTrack,
                MediaKey::VolumeUp => Key::VolumeUp,
                MediaKey::VolumeDown => Key::VolumeDown,
            };
            enigo
                .key(key, Direction::Click)
                .map_err(|e| BridgeError::backend(format!("key injection failed: {e}")))
        }
    }
}

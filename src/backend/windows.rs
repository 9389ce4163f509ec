//! Windows backend: endpoint volume API with key-press fallback.

use super::{AudioEndpoint, MediaBackend, MediaKey, MediaKeys};
use crate::error::{BridgeError, Result};

/// Step applied to the scalar master volume.
const VOLUME_STEP: f32 = 0.05;

pub struct WindowsBackend {
    endpoint: Option<Box<dyn AudioEndpoint>>,
    keys: Option<Box<dyn MediaKeys>>,
}

impl WindowsBackend {
    pub fn new(endpoint: Option<Box<dyn AudioEndpoint>>, keys: Option<Box<dyn MediaKeys>>) -> Self {
        Self { endpoint, keys }
    }

    fn press(&self, key: MediaKey) -> Result<()> {
        match &self.keys {
            Some(keys) => keys.press(key),
            None => Err(BridgeError::unavailable(
                "Key press simulation unavailable for media control",
            )),
        }
    }

    fn endpoint(&self, action: &str) -> Result<&dyn AudioEndpoint> {
        self.endpoint.as_deref().ok_or_else(|| {
            BridgeError::unavailable(format!("Audio endpoint API unavailable: {action} not supported"))
        })
    }

    fn step(&self, delta: f32, fallback: MediaKey) -> Result<()> {
        match &self.endpoint {
            Some(endpoint) => {
                let level = (endpoint.level()? + delta).clamp(0.0, 1.0);
                endpoint.set_level(level)
            }
            None => self.press(fallback),
        }
    }
}

impl MediaBackend for WindowsBackend {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn capabilities(&self) -> Vec<String> {
        let media = if self.keys.is_some() {
            "key presses"
        } else {
            "NOT AVAILABLE"
        };
        let volume = match (&self.endpoint, &self.keys) {
            (Some(_), _) => "Core Audio endpoint",
            (None, Some(_)) => "volume keys (no set/mute)",
            (None, None) => "NOT AVAILABLE",
        };
        let mut lines = vec![
            format!("Media control: {media}"),
            format!("Volume control: {volume}"),
        ];
        if self.endpoint.is_none() {
            lines.push(String::from(
                "TIP: Core Audio endpoint not found; volume set and mute are disabled",
            ));
        }
        lines
    }

    fn play_pause(&self) -> Result<()> {
        self.press(MediaKey::PlayPause)
    }

    fn next(&self) -> Result<()> {
        self.press(MediaKey::Next)
    }

    fn previous(&self) -> Result<()> {
        self.press(MediaKey::Previous)
    }

    fn volume_up(&self) -> Result<()> {
        self.step(VOLUME_STEP, MediaKey::VolumeUp)
    }

    fn volume_down(&self) -> Result<()> {
        self.step(-VOLUME_STEP, MediaKey::VolumeDown)
    }

    fn volume_set(&self, percent: u8) -> Result<()> {
        let endpoint = self.endpoint("volume set")?;
        endpoint.set_level(f32::from(percent.min(100)) / 100.0)
    }

    fn mute_toggle(&self) -> Result<()> {
        let endpoint = self.endpoint("mute toggle")?;
        let muted = endpoint.is_muted()?;
        endpoint.set_muted(!muted)
    }
}

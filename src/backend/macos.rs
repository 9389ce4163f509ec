//! macOS backend: media keys first, AppleScript after.

use std::sync::Arc;

use log::warn;

use super::{CommandRunner, MediaBackend, MediaKey, MediaKeys, VolumeChange};
use crate::error::Result;

/// Matches the step of the native volume keys (1/16).
const VOLUME_STEP_PERCENT: f32 = 6.25;

/// Apps tried in order when media keys cannot be injected.
const PLAYERS: &[&str] = &["Music", "Spotify"];

pub struct MacosBackend {
    runner: Arc<dyn CommandRunner>,
    keys: Option<Box<dyn MediaKeys>>,
}

impl MacosBackend {
    pub fn new(runner: Arc<dyn CommandRunner>, keys: Option<Box<dyn MediaKeys>>) -> Self {
        Self { runner, keys }
    }

    fn applescript(&self, script: &str) -> Result<()> {
        self.runner.run("osascript", &["-e", script])
    }

    fn media(&self, key: MediaKey, player_verb: &str) -> Result<()> {
        if let Some(keys) = &self.keys {
            match keys.press(key) {
                Ok(()) => return Ok(()),
                Err(e) => warn!("Error sending media key: {e}"),
            }
        }
        self.applescript(&player_script(player_verb))
    }

    fn volume(&self, change: VolumeChange) -> Result<()> {
        self.applescript(&volume_script(change))
    }
}

/// Send `verb` to the first running player in [`PLAYERS`].
fn player_script(verb: &str) -> String {
    let mut script = String::new();
    for (i, app) in PLAYERS.iter().enumerate() {
        let keyword = if i == 0 { "if" } else { "else if" };
        script.push_str(&format!(
            "{keyword} application \"{app}\" is running then\n    tell application \"{app}\" to {verb}\n"
        ));
    }
    script.push_str("end if");
    script
}

fn volume_script(change: VolumeChange) -> String {
    match change {
        VolumeChange::Up => format!(
            "set volume output volume (min ((output volume of (get volume settings)) + {VOLUME_STEP_PERCENT}, 100))"
        ),
        VolumeChange::Down => format!(
            "set volume output volume (max ((output volume of (get volume settings)) - {VOLUME_STEP_PERCENT}, 0))"
        ),
        VolumeChange::Set(percent) => {
            format!("set volume output volume {}", percent.min(100))
        }
        VolumeChange::ToggleMute => String::from(
            "set volume output muted not (output muted of (get volume settings))",
        ),
    }
}

impl MediaBackend for MacosBackend {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn capabilities(&self) -> Vec<String> {
        let media = if self.keys.is_some() {
            "media keys, AppleScript fallback"
        } else {
            "AppleScript"
        };
        vec![
            format!("Media control: {media}"),
            String::from("Volume control: AppleScript"),
        ]
    }

    fn play_pause(&self) -> Result<()> {
        self.media(MediaKey::PlayPause, "playpause")
    }

    fn next(&self) -> Result<()> {
        self.media(MediaKey::Next, "next track")
    }

    fn previous(&self) -> Result<()> {
        self.media(MediaKey::Previous, "previous track")
    }

    fn volume_up(&self) -> Result<()> {
        self.volume(VolumeChange::Up)
    }

    fn volume_down(&self) -> Result<()> {
        self.volume(VolumeChange::Down)
    }

    fn volume_set(&self, percent: u8) -> Result<()> {
        self.volume(VolumeChange::Set(percent))
    }

    fn mute_toggle(&self) -> Result<()> {
        self.volume(VolumeChange::ToggleMute)
    }
}

//! Linux backend driven by command-line tools.

use std::sync::Arc;

use super::{CommandRunner, MediaBackend, VolumeChange};
use crate::error::{BridgeError, Result};

const PULSE_SINK: &str = "@DEFAULT_SINK@";
const ALSA_CONTROL: &str = "Master";
const SPOTIFY_BUS_NAME: &str = "org.mpris.MediaPlayer2.spotify";
const MPRIS_OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const VOLUME_STEP_PERCENT: u8 = 5;

/// Media and volume tools found on `PATH` at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tools {
    pub playerctl: bool,
    pub pactl: bool,
    pub amixer: bool,
}

impl Tools {
    pub fn detect() -> Self {
        Self {
            playerctl: on_path("playerctl"),
            pactl: on_path("pactl"),
            amixer: on_path("amixer"),
        }
    }
}

fn on_path(program: &str) -> bool {
    which::which(program).is_ok()
}

pub struct LinuxBackend {
    runner: Arc<dyn CommandRunner>,
    tools: Tools,
}

impl LinuxBackend {
    pub fn new(runner: Arc<dyn CommandRunner>, tools: Tools) -> Self {
        Self { runner, tools }
    }

    /// `playerctl <verb>`, or an MPRIS call straight to Spotify over D-Bus.
    fn media(&self, playerctl_verb: &str, mpris_method: &str) -> Result<()> {
        if self.tools.playerctl {
            self.runner.run("playerctl", &[playerctl_verb])
        } else {
            let dest = format!("--dest={SPOTIFY_BUS_NAME}");
            let method = format!("org.mpris.MediaPlayer2.Player.{mpris_method}");
            self.runner.run(
                "dbus-send",
                &["--print-reply", dest.as_str(), MPRIS_OBJECT_PATH, method.as_str()],
            )
        }
    }

    fn volume(&self, change: VolumeChange) -> Result<()> {
        if self.tools.pactl {
            let (subcommand, value) = match change {
                VolumeChange::Up => ("set-sink-volume", format!("+{VOLUME_STEP_PERCENT}%")),
                VolumeChange::Down => ("set-sink-volume", format!("-{VOLUME_STEP_PERCENT}%")),
                VolumeChange::Set(percent) => ("set-sink-volume", format!("{percent}%")),
                VolumeChange::ToggleMute => ("set-sink-mute", String::from("toggle")),
            };
            self.runner.run("pactl", &[subcommand, PULSE_SINK, value.as_str()])
        } else if self.tools.amixer {
            let value = match change {
                VolumeChange::Up => format!("{VOLUME_STEP_PERCENT}%+"),
                VolumeChange::Down => format!("{VOLUME_STEP_PERCENT}%-"),
                VolumeChange::Set(percent) => format!("{percent}%"),
                VolumeChange::ToggleMute => String::from("toggle"),
            };
            self.runner.run("amixer", &["set", ALSA_CONTROL, value.as_str()])
        } else {
            Err(BridgeError::unavailable("No Linux volume control tool found"))
        }
    }
}

impl MediaBackend for LinuxBackend {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn capabilities(&self) -> Vec<String> {
        let media = if self.tools.playerctl {
            "playerctl"
        } else {
            "dbus (fallback)"
        };
        let volume = if self.tools.pactl {
            "pactl"
        } else if self.tools.amixer {
            "amixer"
        } else {
            "NOT AVAILABLE"
        };

        let mut lines = vec![
            format!("Media control: {media}"),
            format!("Volume control: {volume}"),
        ];
        if !self.tools.playerctl {
            lines.push(String::from(
                "TIP: Install playerctl for better media control: sudo apt install playerctl",
            ));
        }
        if !self.tools.pactl && !self.tools.amixer {
            lines.push(String::from(
                "WARNING: No volume control tool found! Install pulseaudio-utils or alsa-utils",
            ));
        }
        lines
    }

    fn play_pause(&self) -> Result<()> {
        self.media("play-pause", "PlayPause")
    }

    fn next(&self) -> Result<()> {
        self.media("next", "Next")
    }

    fn previous(&self) -> Result<()> {
        self.media("previous", "Previous")
    }

    fn volume_up(&self) -> Result<()> {
        self.volume(VolumeChange::Up)
    }

    fn volume_down(&self) -> Result<()> {
        self.volume(VolumeChange::Down)
    }

    fn volume_set(&self, percent: u8) -> Result<()> {
        self.volume(VolumeChange::Set(percent.min(100)))
    }

    fn mute_toggle(&self) -> Result<()> {
        self.volume(VolumeChange::ToggleMute)
    }
}

//! End-of-phase sound and desktop notification
//!
//! Everything here is fire-and-forget. Failures are logged and dropped so the
//! timer never hears about them.

use focus_core::Phase;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::AlertConfig;

const APP_NAME: &str = "focus";
const TITLE: &str = "Focus";

/// Player commands and candidate sound files, tried in order.
const WORK_END_SOUNDS: &[(&str, &str)] = &[
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
    ("afplay", "/System/Library/Sounds/Glass.aiff"),
];
const BREAK_END_SOUNDS: &[(&str, &str)] = &[
    ("paplay", "/usr/share/sounds/freedesktop/stereo/bell.oga"),
    ("aplay", "/usr/share/sounds/generic.wav"),
    ("afplay", "/System/Library/Sounds/Ping.aiff"),
];

/// Receives phase ends from the event loop.
pub trait AlertSink {
    fn phase_ended(&self, phase: Phase);
    fn close(&self);
}

#[derive(Default)]
pub struct SoundPlayer {
    closed: AtomicBool,
}

impl SoundPlayer {
    pub fn play_work_end(&self) {
        self.play(WORK_END_SOUNDS);
    }

    pub fn play_break_end(&self) {
        self.play(BREAK_END_SOUNDS);
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }

    fn play(&self, candidates: &'static [(&'static str, &'static str)]) {
        if self.closed.load(Ordering::Relaxed) {
            return;
        }
        let Some((player, file)) = candidates
            .iter()
            .find(|(_, file)| Path::new(file).exists())
            .copied()
        else {
            debug!("no sound file available");
            return;
        };

        tokio::spawn(async move {
            let status = Command::new(player)
                .arg(file)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            match status {
                Ok(status) if status.success() => {}
                Ok(status) => warn!(player, %status, "sound player exited with failure"),
                Err(e) => warn!(player, "Audio playback failed: {}", e),
            }
        });
    }
}

#[derive(Default)]
pub struct Notifier;

impl Notifier {
    pub fn notify_phase_end(&self, phase: Phase) {
        let body = phase_end_message(phase);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = notify_rust::Notification::new()
                .summary(TITLE)
                .body(body)
                .appname(APP_NAME)
                .show()
            {
                warn!("Failed to send notification: {}", e);
            }
        });
    }
}

pub fn phase_end_message(phase: Phase) -> &'static str {
    match phase {
        Phase::Work => "Work session complete!",
        Phase::ShortBreak => "Short break over!",
        Phase::LongBreak => "Long break over!",
    }
}

pub struct Alerts {
    sound: Option<SoundPlayer>,
    notifier: Option<Notifier>,
}

impl Alerts {
    pub fn new(config: &AlertConfig) -> Self {
        Self {
            sound: config.sound.then(SoundPlayer::default),
            notifier: config.notifications.then(Notifier::default),
        }
    }
}

impl AlertSink for Alerts {
    fn phase_ended(&self, phase: Phase) {
        if let Some(sound) = &self.sound {
            match phase {
                Phase::Work => sound.play_work_end(),
                Phase::ShortBreak | Phase::LongBreak => sound.play_break_end(),
            }
        }
        if let Some(notifier) = &self.notifier {
            notifier.notify_phase_end(phase);
        }
    }

    fn close(&self) {
        if let Some(sound) = &self.sound {
            sound.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_finished_phase() {
        assert_eq!(phase_end_message(Phase::Work), "Work session complete!");
        assert_eq!(phase_end_message(Phase::ShortBreak), "Short break over!");
        assert_eq!(phase_end_message(Phase::LongBreak), "Long break over!");
    }

    #[test]
    fn disabled_alerts_do_nothing() {
        let alerts = Alerts::new(&AlertConfig {
            sound: false,
            notifications: false,
        });
        assert!(alerts.sound.is_none());
        assert!(alerts.notifier.is_none());
        // no runtime is needed when nothing is enabled
        alerts.phase_ended(Phase::Work);
        alerts.close();
    }

    #[test]
    fn closed_player_ignores_requests() {
        let player = SoundPlayer::default();
        player.close();
        // would need a runtime to spawn the player if it were still open
        player.play_work_end();
        player.play_break_end();
    }
}

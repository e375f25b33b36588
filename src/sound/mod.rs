//! Fire-and-forget sound playback.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;

use crate::board::{SoundPreferences, SoundTrigger};
use crate::config::SoundConfig;

pub trait SoundPlayer {
    /// Start playing `sound_id`. Never blocks on playback, never fails loudly.
    fn play(&self, sound_id: &str);
}

/// Plays the sound chosen for `trigger`, if any.
pub fn play_trigger(player: &dyn SoundPlayer, prefs: &SoundPreferences, trigger: SoundTrigger) {
    match prefs.get(trigger) {
        Some(sound_id) => player.play(sound_id),
        None => tracing::debug!(trigger = trigger.as_str(), "no sound configured"),
    }
}

/// Map a sound id to a file: existing or absolute paths are used as given,
/// anything else is looked up in the sounds directory.
pub fn resolve(sound_id: &str, sounds_dir: &Path) -> PathBuf {
    let direct = Path::new(sound_id);
    if direct.is_absolute() || direct.exists() {
        direct.to_path_buf()
    } else {
        sounds_dir.join(sound_id)
    }
}

/// Spawns an external player (`afplay`, `paplay`, ...) per sound. A new sound
/// replaces one that is still playing.
pub struct CommandPlayer {
    config: SoundConfig,
    sounds_dir: PathBuf,
    current: Mutex<Option<Child>>,
}

impl CommandPlayer {
    pub fn new(config: SoundConfig, sounds_dir: PathBuf) -> Self {
        CommandPlayer {
            config,
            sounds_dir,
            current: Mutex::new(None),
        }
    }

    fn command_for(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.config.command);
        if self.config.command == "afplay"
            && let Some(volume) = self.config.volume
        {
            cmd.args(["-v", &volume.to_string()]);
        }
        cmd.arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl SoundPlayer for CommandPlayer {
    fn play(&self, sound_id: &str) {
        if !self.config.enabled {
            return;
        }
        let path = resolve(sound_id, &self.sounds_dir);
        let Ok(mut current) = self.current.lock() else {
            tracing::warn!("sound player lock poisoned, skipping {sound_id}");
            return;
        };

        if let Some(mut previous) = current.take()
            && matches!(previous.try_wait(), Ok(None))
        {
            let _ = previous.kill();
            let _ = previous.wait();
        }

        match self.command_for(&path).spawn() {
            Ok(child) => *current = Some(child),
            Err(e) => {
                tracing::warn!("sound command '{}' failed: {}", self.config.command, e);
            }
        }
    }
}

/// Player used when sound is unavailable.
pub struct Silent;

impl SoundPlayer for Silent {
    fn play(&self, _sound_id: &str) {}
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Spy(RefCell<Vec<String>>);

    impl SoundPlayer for Spy {
        fn play(&self, sound_id: &str) {
            self.0.borrow_mut().push(sound_id.to_string());
        }
    }

    #[test]
    fn relative_ids_resolve_into_sounds_dir() {
        let dir = Path::new("/tmp/actionboard-sounds");
        assert_eq!(
            resolve("definitely-missing.wav", dir),
            dir.join("definitely-missing.wav")
        );
        assert_eq!(resolve("/abs/ding.wav", dir), PathBuf::from("/abs/ding.wav"));
    }

    #[test]
    fn unset_trigger_is_silent() {
        let spy = Spy::default();
        let mut prefs = SoundPreferences::default();
        play_trigger(&spy, &prefs, SoundTrigger::Checkbox);
        assert!(spy.0.borrow().is_empty());

        prefs.set(SoundTrigger::Checkbox, "pop.wav");
        play_trigger(&spy, &prefs, SoundTrigger::Checkbox);
        play_trigger(&spy, &prefs, SoundTrigger::Celebration);
        assert_eq!(*spy.0.borrow(), vec!["pop.wav".to_string()]);
    }

    #[test]
    fn missing_player_binary_is_not_fatal() {
        let player = CommandPlayer::new(
            SoundConfig {
                enabled: true,
                command: "actionboard-no-such-player".into(),
                volume: None,
            },
            PathBuf::from("/tmp"),
        );
        player.play("ding.wav");
        player.play("ding.wav");
    }

    #[test]
    fn disabled_player_spawns_nothing() {
        let player = CommandPlayer::new(
            SoundConfig {
                enabled: false,
                command: "actionboard-no-such-player".into(),
                volume: None,
            },
            PathBuf::from("/tmp"),
        );
        player.play("ding.wav");
        assert!(player.current.lock().unwrap().is_none());
    }
}

use std::sync::mpsc;
use std::thread;

use super::{KeyValue, SOUND_PREFERENCES_KEY, TASKS_KEY};
use crate::board::{SoundPreferences, TaskCollection};

enum Command {
    Set { key: &'static str, value: String },
    Flush(mpsc::Sender<()>),
}

/// Handle to the background writer that owns the key-value store.
///
/// Writes are queued and applied in submission order, so a later snapshot
/// always lands after an earlier one. Failures are logged and dropped.
#[derive(Clone)]
pub struct Persister {
    tx: mpsc::Sender<Command>,
}

impl Persister {
    pub fn spawn<K>(kv: K) -> Self
    where
        K: KeyValue + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Command>();
        thread::spawn(move || {
            for command in rx {
                match command {
                    Command::Set { key, value } => {
                        if let Err(e) = kv.set(key, &value) {
                            tracing::warn!("failed to persist '{key}': {e:#}");
                        }
                    }
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Persister { tx }
    }

    pub fn save_tasks(&self, tasks: &TaskCollection) {
        match serde_json::to_string(tasks) {
            Ok(value) => self.send(TASKS_KEY, value),
            Err(e) => tracing::warn!("failed to serialize tasks: {e}"),
        }
    }

    pub fn save_sound_preferences(&self, prefs: &SoundPreferences) {
        match serde_json::to_string(prefs) {
            Ok(value) => self.send(SOUND_PREFERENCES_KEY, value),
            Err(e) => tracing::warn!("failed to serialize sound preferences: {e}"),
        }
    }

    /// Block until every write queued so far has been applied.
    pub fn flush(&self) {
        let (done_tx, done_rx) = mpsc::channel();
        if self.tx.send(Command::Flush(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }

    fn send(&self, key: &'static str, value: String) {
        if self.tx.send(Command::Set { key, value }).is_err() {
            tracing::warn!("persistence writer has stopped, dropping write to '{key}'");
        }
    }
}

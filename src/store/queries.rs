use anyhow::Result;
use rusqlite::{OptionalExtension, params};

use super::{KeyValue, SOUND_PREFERENCES_KEY, Store, TASKS_KEY};
use crate::board::{SoundPreferences, TaskCollection, has_unique_ids};

impl KeyValue for Store {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }
}

// ── Typed accessors ──
//
// Anything unreadable is reported as absent: a corrupt value must never stop
// the board from starting.

pub fn load_tasks(kv: &dyn KeyValue) -> Option<TaskCollection> {
    let raw = match kv.get(TASKS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("failed to read saved tasks: {e:#}");
            return None;
        }
    };
    match serde_json::from_str::<TaskCollection>(&raw) {
        Ok(tasks) if tasks.is_empty() => {
            tracing::warn!("saved task list is empty, ignoring it");
            None
        }
        Ok(tasks) if has_unique_ids(&tasks) => Some(tasks),
        Ok(_) => {
            tracing::warn!("saved tasks contain duplicate ids, ignoring them");
            None
        }
        Err(e) => {
            tracing::warn!("saved tasks are malformed, ignoring them: {e}");
            None
        }
    }
}

pub fn load_sound_preferences(kv: &dyn KeyValue) -> SoundPreferences {
    match kv.get(SOUND_PREFERENCES_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("saved sound preferences are malformed, ignoring them: {e}");
            SoundPreferences::default()
        }),
        Ok(None) => SoundPreferences::default(),
        Err(e) => {
            tracing::warn!("failed to read sound preferences: {e:#}");
            SoundPreferences::default()
        }
    }
}

pub fn save_tasks(kv: &dyn KeyValue, tasks: &TaskCollection) -> Result<()> {
    kv.set(TASKS_KEY, &serde_json::to_string(tasks)?)
}

pub fn save_sound_preferences(kv: &dyn KeyValue, prefs: &SoundPreferences) -> Result<()> {
    kv.set(SOUND_PREFERENCES_KEY, &serde_json::to_string(prefs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{DefaultTasks, SoundTrigger};

    #[test]
    fn test_get_missing_key() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.get("nope").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let store = Store::open_in_memory().unwrap();
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_tasks_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let mut tasks = DefaultTasks::builtin().to_collection();
        tasks[1].completed = true;

        save_tasks(&store, &tasks).unwrap();
        assert_eq!(load_tasks(&store), Some(tasks));
    }

    #[test]
    fn test_corrupt_tasks_are_absent() {
        let store = Store::open_in_memory().unwrap();
        store.set(TASKS_KEY, "{not json").unwrap();
        assert_eq!(load_tasks(&store), None);

        store.set(TASKS_KEY, r#"[{"id":1}]"#).unwrap();
        assert_eq!(load_tasks(&store), None);
    }

    #[test]
    fn test_duplicate_ids_are_absent() {
        let store = Store::open_in_memory().unwrap();
        let mut tasks = DefaultTasks::builtin().to_collection();
        tasks[1].id = tasks[0].id;
        save_tasks(&store, &tasks).unwrap();
        assert_eq!(load_tasks(&store), None);
    }

    #[test]
    fn test_empty_tasks_are_absent() {
        let store = Store::open_in_memory().unwrap();
        store.set(TASKS_KEY, "[]").unwrap();
        assert_eq!(load_tasks(&store), None);
    }

    #[test]
    fn test_sound_preferences_round_trip() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(load_sound_preferences(&store), SoundPreferences::default());

        let mut prefs = SoundPreferences::default();
        prefs.set(SoundTrigger::Checkbox, "pop.wav");
        prefs.set(SoundTrigger::Celebration, "fanfare.wav");
        save_sound_preferences(&store, &prefs).unwrap();
        assert_eq!(load_sound_preferences(&store), prefs);

        store.set(SOUND_PREFERENCES_KEY, "42").unwrap();
        assert_eq!(load_sound_preferences(&store), SoundPreferences::default());
    }

    #[test]
    fn test_tasks_and_sounds_are_independent() {
        let store = Store::open_in_memory().unwrap();
        store.set(SOUND_PREFERENCES_KEY, "garbage").unwrap();
        let tasks = DefaultTasks::builtin().to_collection();
        save_tasks(&store, &tasks).unwrap();
        assert_eq!(load_tasks(&store), Some(tasks));
    }
}

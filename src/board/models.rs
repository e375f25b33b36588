use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Checkbox,
    Triggerable,
}

/// What activating a task does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Toggle,
    NavigateAndComplete,
    AiPrioritize,
}

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Toggle => "toggle",
            Behavior::NavigateAndComplete => "navigate_and_complete",
            Behavior::AiPrioritize => "ai_prioritize",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub label: String,
    pub control_kind: ControlKind,
    pub behavior: Behavior,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(id: TaskId, label: &str, control_kind: ControlKind, behavior: Behavior) -> Self {
        Task {
            id,
            label: label.to_string(),
            control_kind,
            behavior,
            completed: false,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match (self.control_kind, self.completed) {
            (ControlKind::Checkbox, false) => "☐",
            (ControlKind::Checkbox, true) => "☑",
            (ControlKind::Triggerable, false) => "▶",
            (ControlKind::Triggerable, true) => "✓",
        }
    }
}

/// The live, ordered task list. Order is display and priority order.
pub type TaskCollection = Vec<Task>;

/// Returns `true` when every id in the collection is distinct.
pub fn has_unique_ids(tasks: &[Task]) -> bool {
    let mut seen = HashSet::with_capacity(tasks.len());
    tasks.iter().all(|t| seen.insert(t.id))
}

/// Immutable default board, injected into the task store and cloned on reset.
#[derive(Debug, Clone)]
pub struct DefaultTasks(Arc<[Task]>);

impl DefaultTasks {
    pub fn new(tasks: Vec<Task>) -> Result<Self> {
        if tasks.is_empty() {
            bail!("the default task list is empty");
        }
        if !has_unique_ids(&tasks) {
            bail!("the default task list contains duplicate ids");
        }
        let tasks: Vec<Task> = tasks
            .into_iter()
            .map(|t| Task {
                completed: false,
                ..t
            })
            .collect();
        Ok(DefaultTasks(tasks.into()))
    }

    pub fn builtin() -> Self {
        DefaultTasks(
            vec![
                Task::new(
                    1,
                    "Review project requirements",
                    ControlKind::Checkbox,
                    Behavior::Toggle,
                ),
                Task::new(
                    2,
                    "Set up development environment",
                    ControlKind::Checkbox,
                    Behavior::Toggle,
                ),
                Task::new(
                    3,
                    "Prioritize remaining work",
                    ControlKind::Triggerable,
                    Behavior::AiPrioritize,
                ),
                Task::new(
                    4,
                    "Initiate final review",
                    ControlKind::Triggerable,
                    Behavior::NavigateAndComplete,
                ),
            ]
            .into(),
        )
    }

    pub fn to_collection(&self) -> TaskCollection {
        self.0.to_vec()
    }
}

impl Default for DefaultTasks {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Events that can have a sound attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundTrigger {
    Checkbox,
    Trigger,
    Celebration,
}

impl SoundTrigger {
    pub const ALL: [SoundTrigger; 3] = [
        SoundTrigger::Checkbox,
        SoundTrigger::Trigger,
        SoundTrigger::Celebration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundTrigger::Checkbox => "checkbox",
            SoundTrigger::Trigger => "trigger",
            SoundTrigger::Celebration => "celebration",
        }
    }
}

impl std::str::FromStr for SoundTrigger {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "checkbox" => Ok(SoundTrigger::Checkbox),
            "trigger" => Ok(SoundTrigger::Trigger),
            "celebration" => Ok(SoundTrigger::Celebration),
            other => Err(format!(
                "unknown sound trigger '{other}' (expected checkbox, trigger or celebration)"
            )),
        }
    }
}

/// Sound chosen for each trigger. Unset triggers stay silent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundPreferences(BTreeMap<SoundTrigger, String>);

impl SoundPreferences {
    pub fn get(&self, trigger: SoundTrigger) -> Option<&str> {
        self.0.get(&trigger).map(String::as_str)
    }

    pub fn set(&mut self, trigger: SoundTrigger, sound_id: &str) {
        if sound_id.trim().is_empty() {
            self.0.remove(&trigger);
        } else {
            self.0.insert(trigger, sound_id.trim().to_string());
        }
    }

    pub fn clear(&mut self, trigger: SoundTrigger) {
        self.0.remove(&trigger);
    }
}

/// Advisory AI ordering, shown to the user and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrioritizationReport {
    pub ordered_labels: Vec<String>,
    pub reasoning: String,
    pub generated_at: DateTime<Utc>,
}

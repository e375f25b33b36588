use super::models::{DefaultTasks, Task, TaskCollection, TaskId};
use crate::store::Persister;

/// Canonical task list. Every committed mutation is written through to the
/// persister; the in-memory list stays authoritative if that write fails.
pub struct TaskStore {
    tasks: TaskCollection,
    defaults: DefaultTasks,
    persister: Persister,
}

impl TaskStore {
    /// Restore the saved list, falling back to the defaults when nothing
    /// usable was saved.
    pub fn restore(saved: Option<TaskCollection>, defaults: DefaultTasks, persister: Persister) -> Self {
        let tasks = saved.unwrap_or_else(|| defaults.to_collection());
        TaskStore {
            tasks,
            defaults,
            persister,
        }
    }

    pub fn tasks(&self) -> &TaskCollection {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Mark a task completed. Returns `false` (and writes nothing) when the
    /// task is unknown or already done.
    pub fn complete(&mut self, id: TaskId) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            tracing::debug!(task_id = id, "complete ignored: unknown task");
            return false;
        };
        if task.completed {
            tracing::debug!(task_id = id, "complete ignored: already completed");
            return false;
        }
        task.completed = true;
        tracing::info!(task_id = id, label = %task.label, "task completed");
        self.persister.save_tasks(&self.tasks);
        true
    }

    /// Replace the list with a fresh copy of the defaults.
    pub fn reset(&mut self) {
        self.tasks = self.defaults.to_collection();
        tracing::info!("board reset to defaults");
        self.persister.save_tasks(&self.tasks);
    }

    pub fn persister(&self) -> &Persister {
        &self.persister
    }
}
